/*!
# Scaffold

Templated file creation: render an inline template with `{{var}}`
placeholders and write it to a project-relative destination. Independent of
the patch machinery; existing files are skipped unless the run is forced.
*/

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::{EngineError, ScaffoldOutcome};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern")
});

/// One templated file to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldRequest {
    /// Project-relative destination path.
    pub dest: PathBuf,
    /// Inline template text with `{{var}}` placeholders.
    pub template: String,
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// Substitutes every placeholder. Unresolved placeholders are an error so
/// a typo cannot silently emit `{{projet_name}}` into a file.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> Result<String, EngineError> {
    let mut missing: Vec<String> = Vec::new();
    let rendered = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
        let key = &caps[1];
        match vars.get(key) {
            Some(value) => value.clone(),
            None => {
                missing.push(key.to_string());
                String::new()
            }
        }
    });
    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        missing.dedup();
        Err(EngineError::template(format!(
            "unresolved placeholders: {}",
            missing.join(", ")
        )))
    }
}

/// Renders and writes one scaffold. In dry-run mode the outcome is
/// classified as if the write had happened, but nothing touches disk.
pub fn create(
    root: &Path,
    request: &ScaffoldRequest,
    force: bool,
    dry_run: bool,
) -> ScaffoldOutcome {
    let dest = root.join(&request.dest);
    if dest.exists() && !force {
        debug!(dest = %dest.display(), "scaffold destination exists");
        return ScaffoldOutcome::AlreadyExists;
    }

    let rendered = match render(&request.template, &request.vars) {
        Ok(text) => text,
        Err(err) => return ScaffoldOutcome::failed(err.to_string()),
    };

    if dry_run {
        return ScaffoldOutcome::Created;
    }

    if let Some(parent) = dest.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            return ScaffoldOutcome::failed(format!(
                "cannot create directory {}: {err}",
                parent.display()
            ));
        }
    }
    match std::fs::write(&dest, rendered) {
        Ok(()) => ScaffoldOutcome::Created,
        Err(err) => ScaffoldOutcome::failed(
            EngineError::Write {
                path: dest.clone(),
                source: err,
            }
            .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_substitutes_placeholders() {
        let out = render(
            "pub fn {{ name }}() { init(\"{{name}}\"); }",
            &vars(&[("name", "telemetry")]),
        )
        .unwrap();
        assert_eq!(out, "pub fn telemetry() { init(\"telemetry\"); }");
    }

    #[test]
    fn render_rejects_unresolved_placeholders() {
        let err = render("{{ missing }}", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn create_then_skip_then_force() {
        let dir = TempDir::new().unwrap();
        let request = ScaffoldRequest {
            dest: PathBuf::from("src/telemetry.rs"),
            template: "// {{crate_name}}\n".to_string(),
            vars: vars(&[("crate_name", "demo")]),
        };

        assert_eq!(
            create(dir.path(), &request, false, false),
            ScaffoldOutcome::Created
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("src/telemetry.rs")).unwrap(),
            "// demo\n"
        );
        assert_eq!(
            create(dir.path(), &request, false, false),
            ScaffoldOutcome::AlreadyExists
        );
        assert_eq!(
            create(dir.path(), &request, true, false),
            ScaffoldOutcome::Created
        );
    }

    #[test]
    fn dry_run_never_touches_disk() {
        let dir = TempDir::new().unwrap();
        let request = ScaffoldRequest {
            dest: PathBuf::from("src/new.rs"),
            template: "// new\n".to_string(),
            vars: BTreeMap::new(),
        };
        assert_eq!(
            create(dir.path(), &request, false, true),
            ScaffoldOutcome::Created
        );
        assert!(!dir.path().join("src/new.rs").exists());
    }
}
