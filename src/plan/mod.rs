/*!
# Plan Files

A plan is the external patch catalogue in file form: a TOML document with
`[[patch]]` and `[[create]]` entries that deserializes into pure-data
`Patch` and `ScaffoldRequest` values. The engine never hardcodes concrete
patches; everything it applies arrives through a plan.

```toml
name = "wire telemetry"

[[create]]
dest = "src/telemetry.rs"
template = "pub fn install() {}\n"

[[patch]]
label = "install telemetry in main"
target = "src/main.rs"
recipe = [{ kind = "function", name = "main" }]
idempotency = { check = "call_present", callee = "telemetry::install" }
transform = { action = "append_child", fragment = "telemetry::install();" }
dependencies = ["tracing"]
```
*/

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::EngineError;
use crate::patch::Patch;
use crate::scaffold::ScaffoldRequest;

/// Deserialized plan document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "patch")]
    pub patches: Vec<Patch>,
    #[serde(default, rename = "create")]
    pub scaffolds: Vec<ScaffoldRequest>,
}

impl Plan {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::plan(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
            .map_err(|e| EngineError::plan(format!("{}: {e}", path.display())))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
        toml::from_str(raw).map_err(|e| EngineError::plan(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty() && self.scaffolds.is_empty()
    }

    /// Target files in first-seen submission order, de-duplicated.
    pub fn target_files(&self) -> Vec<&PathBuf> {
        let mut seen: Vec<&PathBuf> = Vec::new();
        for patch in &self.patches {
            if !seen.contains(&&patch.target) {
                seen.push(&patch.target);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAN: &str = r#"
name = "wire telemetry"

[[create]]
dest = "src/telemetry.rs"
template = "pub fn install() {}\n"

[[patch]]
label = "install telemetry in main"
target = "src/main.rs"
recipe = [{ kind = "function", name = "main" }]
idempotency = { check = "call_present", callee = "telemetry::install" }
transform = { action = "append_child", fragment = "telemetry::install();" }
dependencies = ["tracing"]

[[patch]]
label = "declare module"
target = "src/main.rs"
recipe = [{ kind = "pattern", text = "fn main" }]
transform = { action = "insert_before", fragment = "mod telemetry;" }
"#;

    #[test]
    fn plan_parses_patches_and_scaffolds() {
        let plan = Plan::from_toml_str(PLAN).unwrap();
        assert_eq!(plan.name.as_deref(), Some("wire telemetry"));
        assert_eq!(plan.patches.len(), 2);
        assert_eq!(plan.scaffolds.len(), 1);
        assert_eq!(plan.patches[0].dependencies, vec!["tracing"]);
    }

    #[test]
    fn target_files_preserve_submission_order() {
        let plan = Plan::from_toml_str(PLAN).unwrap();
        let targets = plan.target_files();
        assert_eq!(targets, vec![&PathBuf::from("src/main.rs")]);
    }

    #[test]
    fn malformed_plan_is_a_plan_error() {
        let err = Plan::from_toml_str("[[patch]]\nlabel = 1\n").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn empty_document_is_an_empty_plan() {
        let plan = Plan::from_toml_str("").unwrap();
        assert!(plan.is_empty());
    }
}
