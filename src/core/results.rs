/*!
# Run Results

Outcome classification for patches and scaffolds, plus the aggregated
`RunResult` consumed by the reporters. Outcome order always mirrors
submission order so reports are reproducible run to run.
*/

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Terminal classification of one patch application.
///
/// All four variants are valid results of a correct run; none of them
/// represents an engine bug by itself. Reasons are operator-facing
/// remediation text, never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// The transform ran and the tree was updated.
    Applied,
    /// The idempotency check found the patch's effect already present;
    /// nothing was mutated.
    AlreadyApplied,
    /// The recipe dead-ended: an expected structural anchor is absent.
    Skipped { reason: String },
    /// Parse, transform or write failure while handling this patch.
    Failed { reason: String },
}

impl PatchOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        PatchOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        PatchOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, PatchOutcome::Applied)
    }

    /// Short tag for tabular output.
    pub fn tag(&self) -> &'static str {
        match self {
            PatchOutcome::Applied => "applied",
            PatchOutcome::AlreadyApplied => "already applied",
            PatchOutcome::Skipped { .. } => "skipped",
            PatchOutcome::Failed { .. } => "failed",
        }
    }

    /// Remediation text, present only for Skipped/Failed.
    pub fn reason(&self) -> Option<&str> {
        match self {
            PatchOutcome::Skipped { reason } | PatchOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Terminal classification of one templated file creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScaffoldOutcome {
    Created,
    AlreadyExists,
    Failed { reason: String },
}

impl ScaffoldOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        ScaffoldOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ScaffoldOutcome::Created => "created",
            ScaffoldOutcome::AlreadyExists => "already exists",
            ScaffoldOutcome::Failed { .. } => "failed",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ScaffoldOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }
}

/// One (patch label, outcome) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub label: String,
    pub outcome: PatchOutcome,
}

/// Ordered outcomes for a single target file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub records: Vec<PatchRecord>,
}

impl FileReport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, outcome: PatchOutcome) {
        self.records.push(PatchRecord {
            label: label.into(),
            outcome,
        });
    }

    pub fn applied_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome.is_applied())
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.records
            .iter()
            .any(|r| matches!(r.outcome, PatchOutcome::Failed { .. }))
    }
}

/// One (destination, outcome) pair for file creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldRecord {
    pub dest: PathBuf,
    pub outcome: ScaffoldOutcome,
}

/// Aggregate totals across every patch record in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeTotals {
    pub applied: usize,
    pub already_applied: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Metadata about one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub start_time: Option<std::time::SystemTime>,
    pub end_time: Option<std::time::SystemTime>,
    pub engine_version: String,
    /// Rust sources found while enumerating the project root.
    pub sources_enumerated: usize,
    pub dry_run: bool,
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self {
            start_time: Some(std::time::SystemTime::now()),
            end_time: None,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            sources_enumerated: 0,
            dry_run: false,
        }
    }
}

/// Aggregated results of one run: per-file outcome lists in submission
/// order, scaffold outcomes, and the de-duplicated set of dependency
/// identifiers introduced by `Applied` patches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunResult {
    files: Vec<FileReport>,
    scaffolds: Vec<ScaffoldRecord>,
    dependencies: BTreeSet<String>,
    metadata: RunMetadata,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file_report(&mut self, report: FileReport) {
        self.files.push(report);
    }

    pub fn add_scaffold(&mut self, dest: impl Into<PathBuf>, outcome: ScaffoldOutcome) {
        self.scaffolds.push(ScaffoldRecord {
            dest: dest.into(),
            outcome,
        });
    }

    /// Dependency identifiers are only ever collected from `Applied`
    /// outcomes; the caller guarantees that by construction.
    pub fn add_dependencies<I, S>(&mut self, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
    }

    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn scaffolds(&self) -> &[ScaffoldRecord] {
        &self.scaffolds
    }

    pub fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut RunMetadata {
        &mut self.metadata
    }

    pub fn set_end_time(&mut self) {
        self.metadata.end_time = Some(std::time::SystemTime::now());
    }

    pub fn totals(&self) -> OutcomeTotals {
        let mut totals = OutcomeTotals::default();
        for record in self.files.iter().flat_map(|f| &f.records) {
            match record.outcome {
                PatchOutcome::Applied => totals.applied += 1,
                PatchOutcome::AlreadyApplied => totals.already_applied += 1,
                PatchOutcome::Skipped { .. } => totals.skipped += 1,
                PatchOutcome::Failed { .. } => totals.failed += 1,
            }
        }
        totals
    }

    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|f| f.has_failures())
            || self
                .scaffolds
                .iter()
                .any(|s| matches!(s.outcome, ScaffoldOutcome::Failed { .. }))
    }

    pub fn duration(&self) -> Option<std::time::Duration> {
        match (self.metadata.start_time, self.metadata.end_time) {
            (Some(start), Some(end)) => end.duration_since(start).ok(),
            _ => None,
        }
    }

}

impl std::fmt::Display for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let totals = self.totals();
        writeln!(f, "Run result:")?;
        writeln!(f, "  Applied: {}", totals.applied)?;
        writeln!(f, "  Already applied: {}", totals.already_applied)?;
        writeln!(f, "  Skipped: {}", totals.skipped)?;
        writeln!(f, "  Failed: {}", totals.failed)?;
        writeln!(f, "  Files touched: {}", self.files.len())?;
        if !self.dependencies.is_empty() {
            let deps: Vec<&str> = self.dependencies.iter().map(String::as_str).collect();
            writeln!(f, "  Dependencies introduced: {}", deps.join(", "))?;
        }
        if let Some(duration) = self.duration() {
            writeln!(f, "  Run time: {:.2?}", duration)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_report() -> FileReport {
        let mut report = FileReport::new("src/main.rs");
        report.push("wire telemetry", PatchOutcome::Applied);
        report.push("wire telemetry again", PatchOutcome::AlreadyApplied);
        report.push(
            "add helper call",
            PatchOutcome::skipped("fn `helper/1` not found under `mod demo`"),
        );
        report
    }

    #[test]
    fn totals_count_every_outcome_kind() {
        let mut result = RunResult::new();
        let mut report = sample_report();
        report.push("broken", PatchOutcome::failed("boom"));
        result.add_file_report(report);

        let totals = result.totals();
        assert_eq!(totals.applied, 1);
        assert_eq!(totals.already_applied, 1);
        assert_eq!(totals.skipped, 1);
        assert_eq!(totals.failed, 1);
        assert!(result.has_failures());
    }

    #[test]
    fn dependencies_deduplicate() {
        let mut result = RunResult::new();
        result.add_dependencies(["tracing", "tracing-subscriber"]);
        result.add_dependencies(["tracing"]);
        assert_eq!(result.dependencies().len(), 2);
    }

    #[test]
    fn outcome_reasons_only_on_skipped_and_failed() {
        assert_eq!(PatchOutcome::Applied.reason(), None);
        assert_eq!(PatchOutcome::AlreadyApplied.reason(), None);
        assert_eq!(PatchOutcome::skipped("anchor missing").reason(), Some("anchor missing"));
        assert_eq!(PatchOutcome::failed("io").reason(), Some("io"));
    }

    #[test]
    fn file_report_counts() {
        let report = sample_report();
        assert_eq!(report.applied_count(), 1);
        assert!(!report.has_failures());
    }
}
