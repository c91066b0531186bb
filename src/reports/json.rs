//! JSON rendering of a run result, for CI and tooling integration.

use crate::core::RunResult;

pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, result: &RunResult) -> serde_json::Result<String> {
        serde_json::to_string_pretty(result)
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FileReport, PatchOutcome, RunResult};

    #[test]
    fn json_report_is_machine_readable() {
        let mut result = RunResult::new();
        let mut report = FileReport::new("src/lib.rs");
        report.push("patch", PatchOutcome::failed("boom"));
        result.add_file_report(report);

        let raw = JsonReporter::new().render(&result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value["files"][0]["records"][0]["outcome"]["outcome"],
            "failed"
        );
        assert_eq!(value["files"][0]["records"][0]["outcome"]["reason"], "boom");
    }
}
