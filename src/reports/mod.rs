/*!
# Reports Module

Rendering of a `RunResult` for the operator:

- **Text** - grouped per file, one line per patch, remediation text for
  every Skipped/Failed entry, plus the introduced-dependency block.
- **JSON** - structured report for CI integration.
*/

pub mod json;
pub mod text;

pub use json::JsonReporter;
pub use text::TextReporter;

use serde::{Deserialize, Serialize};

/// Output format for the final run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!(ReportFormat::from_name("TEXT"), Some(ReportFormat::Text));
        assert_eq!(ReportFormat::from_name("json"), Some(ReportFormat::Json));
        assert_eq!(ReportFormat::from_name("sarif"), None);
    }
}
