/*!
# Text Reporter

Console report for a run: per-file patch outcomes in submission order,
remediation text for every Skipped/Failed entry, scaffold results and the
dependency block for the downstream "install now?" decision. Colors honor
`NO_COLOR`/`FORCE_COLOR` so CI logs stay clean.
*/

use std::fmt::Write as _;

use crate::core::{PatchOutcome, RunResult, ScaffoldOutcome};

/// ANSI palette.
struct Colors;

impl Colors {
    const RESET: &'static str = "\x1b[0m";
    const BOLD: &'static str = "\x1b[1m";
    const RED: &'static str = "\x1b[31m";
    const GREEN: &'static str = "\x1b[32m";
    const YELLOW: &'static str = "\x1b[33m";
    const CYAN: &'static str = "\x1b[36m";
    const GRAY: &'static str = "\x1b[90m";
}

/// Text renderer for run results.
pub struct TextReporter {
    use_colors: bool,
}

impl TextReporter {
    pub fn new() -> Self {
        Self {
            use_colors: Self::supports_colors(),
        }
    }

    /// Color-free reporter for files and CI logs.
    pub fn plain() -> Self {
        Self { use_colors: false }
    }

    fn supports_colors() -> bool {
        if std::env::var("NO_COLOR").is_ok() {
            return false;
        }
        if std::env::var("FORCE_COLOR").is_ok() {
            return true;
        }
        if let Ok(term) = std::env::var("TERM") {
            if term == "dumb" || term.is_empty() {
                return false;
            }
        }
        true
    }

    pub fn render(&self, result: &RunResult) -> String {
        let mut out = String::new();
        let title = if result.metadata().dry_run {
            "Patch run summary (dry run)"
        } else {
            "Patch run summary"
        };
        let _ = writeln!(out, "{}", self.paint(Colors::BOLD, title));

        for report in result.files() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{}",
                self.paint(Colors::BOLD, &report.path.display().to_string())
            );
            for record in &report.records {
                let _ = writeln!(
                    out,
                    "  [{}] {}",
                    self.paint_outcome(&record.outcome),
                    record.label
                );
                if let Some(reason) = record.outcome.reason() {
                    let _ = writeln!(out, "      -> {}", self.paint(Colors::GRAY, reason));
                }
            }
        }

        if !result.scaffolds().is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", self.paint(Colors::BOLD, "Created files"));
            for record in result.scaffolds() {
                let _ = writeln!(
                    out,
                    "  [{}] {}",
                    self.paint_scaffold(&record.outcome),
                    record.dest.display()
                );
                if let Some(reason) = record.outcome.reason() {
                    let _ = writeln!(out, "      -> {}", self.paint(Colors::GRAY, reason));
                }
            }
        }

        if !result.dependencies().is_empty() {
            let deps: Vec<&str> = result.dependencies().iter().map(String::as_str).collect();
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "{} {}",
                self.paint(Colors::BOLD, "Dependencies introduced:"),
                deps.join(", ")
            );
            let _ = writeln!(
                out,
                "  install with: {}",
                self.paint(Colors::CYAN, &format!("cargo add {}", deps.join(" ")))
            );
        }

        let totals = result.totals();
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Totals: {} applied, {} already applied, {} skipped, {} failed ({} source files scanned)",
            totals.applied,
            totals.already_applied,
            totals.skipped,
            totals.failed,
            result.metadata().sources_enumerated
        );
        out
    }

    fn paint_outcome(&self, outcome: &PatchOutcome) -> String {
        let color = match outcome {
            PatchOutcome::Applied => Colors::GREEN,
            PatchOutcome::AlreadyApplied => Colors::CYAN,
            PatchOutcome::Skipped { .. } => Colors::YELLOW,
            PatchOutcome::Failed { .. } => Colors::RED,
        };
        self.paint(color, outcome.tag())
    }

    fn paint_scaffold(&self, outcome: &ScaffoldOutcome) -> String {
        let color = match outcome {
            ScaffoldOutcome::Created => Colors::GREEN,
            ScaffoldOutcome::AlreadyExists => Colors::CYAN,
            ScaffoldOutcome::Failed { .. } => Colors::RED,
        };
        self.paint(color, outcome.tag())
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{}", Colors::RESET)
        } else {
            text.to_string()
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileReport, RunResult, ScaffoldOutcome};

    fn sample_result() -> RunResult {
        let mut result = RunResult::new();
        let mut report = FileReport::new("src/main.rs");
        report.push("install telemetry", PatchOutcome::Applied);
        report.push(
            "add helper call",
            PatchOutcome::skipped("call to `helper` not found under fn `main/0`"),
        );
        result.add_file_report(report);
        result.add_scaffold("src/telemetry.rs", ScaffoldOutcome::Created);
        result.add_dependencies(["tracing", "anyhow"]);
        result
    }

    #[test]
    fn plain_render_lists_every_outcome_and_reason() {
        let text = TextReporter::plain().render(&sample_result());
        assert!(text.contains("src/main.rs"));
        assert!(text.contains("[applied] install telemetry"));
        assert!(text.contains("[skipped] add helper call"));
        assert!(text.contains("-> call to `helper` not found under fn `main/0`"));
        assert!(text.contains("[created] src/telemetry.rs"));
        assert!(text.contains("Dependencies introduced: anyhow, tracing"));
        assert!(text.contains("cargo add anyhow tracing"));
        assert!(text.contains("1 applied, 0 already applied, 1 skipped, 0 failed"));
    }

    #[test]
    fn plain_render_has_no_ansi_escapes() {
        let text = TextReporter::plain().render(&sample_result());
        assert!(!text.contains('\x1b'));
    }
}
