/*!
# Run Aggregator

Orchestrates one run: scaffolds first (so later patches may target freshly
created files), then every target file in submission order. Each file is
parsed once, its patches applied sequentially against the evolving tree,
and written back once at the end. Failures stay file-scoped; the only
run-fatal conditions are a missing plan or an unusable project root.

File-level fan-out over rayon is an optional optimization (`workers > 1`);
per-file state is independently owned and results are re-assembled in
submission order, so parallel runs report identically to sequential ones.
*/

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::{EngineError, FileReport, PatchOutcome, RunResult, ScaffoldOutcome};
use crate::executor::PatchExecutor;
use crate::parser::SourceTree;
use crate::patch::Patch;
use crate::plan::Plan;
use crate::scaffold;

/// Explicit run inputs. Project conventions are never discovered
/// ambiently; everything the engine assumes about its surroundings
/// arrives through this struct.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project_root: PathBuf,
    /// Report outcomes without writing anything.
    pub dry_run: bool,
    /// Overwrite existing scaffold destinations.
    pub force: bool,
    /// File-level worker count; 0 and 1 both mean sequential.
    pub workers: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            dry_run: false,
            force: false,
            workers: 1,
        }
    }
}

/// Applies a whole plan to a project.
#[derive(Debug, Default)]
pub struct Runner {
    config: RunConfig,
    executor: PatchExecutor,
}

impl Runner {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            executor: PatchExecutor::new(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run(&self, plan: &Plan) -> Result<RunResult, EngineError> {
        let root = self.config.project_root.as_path();
        if !root.is_dir() {
            return Err(EngineError::ProjectRoot {
                path: root.to_path_buf(),
            });
        }
        let sources = enumerate_sources(root)?;
        info!(
            project = %root.display(),
            sources = sources.len(),
            patches = plan.patches.len(),
            scaffolds = plan.scaffolds.len(),
            dry_run = self.config.dry_run,
            "starting run"
        );

        let mut result = RunResult::new();
        result.metadata_mut().sources_enumerated = sources.len();
        result.metadata_mut().dry_run = self.config.dry_run;

        // Dry-run scaffolds exist only in memory; patches targeting them
        // read their rendered content from here instead of disk.
        let mut virtual_files: BTreeMap<PathBuf, String> = BTreeMap::new();
        for request in &plan.scaffolds {
            let outcome = scaffold::create(root, request, self.config.force, self.config.dry_run);
            debug!(dest = %request.dest.display(), outcome = outcome.tag(), "scaffold");
            if self.config.dry_run && matches!(outcome, ScaffoldOutcome::Created) {
                if let Ok(text) = scaffold::render(&request.template, &request.vars) {
                    virtual_files.insert(request.dest.clone(), text);
                }
            }
            result.add_scaffold(request.dest.clone(), outcome);
        }

        let groups = group_by_target(&plan.patches);
        let processed: Vec<(FileReport, BTreeSet<String>)> = if self.config.workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.workers)
                .build()
            {
                Ok(pool) => pool.install(|| {
                    groups
                        .par_iter()
                        .map(|(target, patches)| self.process_file(target, patches, &virtual_files))
                        .collect()
                }),
                Err(err) => {
                    warn!(error = %err, "worker pool unavailable, running sequentially");
                    groups
                        .iter()
                        .map(|(target, patches)| self.process_file(target, patches, &virtual_files))
                        .collect()
                }
            }
        } else {
            groups
                .iter()
                .map(|(target, patches)| self.process_file(target, patches, &virtual_files))
                .collect()
        };

        for (report, dependencies) in processed {
            result.add_dependencies(dependencies);
            result.add_file_report(report);
        }
        result.set_end_time();
        Ok(result)
    }

    /// Applies one file's patch queue. Never returns an error: read, parse
    /// and write failures are folded into the file's outcomes.
    fn process_file(
        &self,
        target: &Path,
        patches: &[&Patch],
        virtual_files: &BTreeMap<PathBuf, String>,
    ) -> (FileReport, BTreeSet<String>) {
        let absolute = self.config.project_root.join(target);
        let mut report = FileReport::new(target);
        let mut dependencies = BTreeSet::new();

        let text = if let Some(text) = virtual_files.get(target) {
            text.clone()
        } else {
            match std::fs::read_to_string(&absolute) {
                Ok(text) => text,
                Err(err) => {
                    let reason = EngineError::Read {
                        path: absolute.clone(),
                        source: err,
                    }
                    .to_string();
                    for patch in patches {
                        report.push(&patch.label, PatchOutcome::failed(reason.clone()));
                    }
                    return (report, dependencies);
                }
            }
        };

        let mut tree = match SourceTree::parse(text) {
            Ok(tree) => tree,
            Err(err) => {
                let reason =
                    format!("file could not be parsed ({err}); fix the syntax error and re-run");
                for patch in patches {
                    report.push(&patch.label, PatchOutcome::failed(reason.clone()));
                }
                return (report, dependencies);
            }
        };

        for patch in patches {
            let (next, outcome) = self.executor.apply(&tree, patch);
            info!(file = %target.display(), label = %patch.label, outcome = outcome.tag(), "patch");
            if outcome.is_applied() {
                dependencies.extend(patch.dependencies.iter().cloned());
            }
            report.push(&patch.label, outcome);
            tree = next;
        }

        if report.applied_count() > 0 && !self.config.dry_run {
            if let Err(err) = std::fs::write(&absolute, tree.print()) {
                // Nothing was persisted; the applied outcomes did not happen.
                let reason = format!(
                    "changes discarded, {}",
                    EngineError::Write {
                        path: absolute.clone(),
                        source: err,
                    }
                );
                for record in &mut report.records {
                    if record.outcome.is_applied() {
                        record.outcome = PatchOutcome::failed(reason.clone());
                    }
                }
                dependencies.clear();
            }
        }

        (report, dependencies)
    }
}

/// Groups patches by target file, preserving first-seen submission order
/// for files and submission order for patches within a file.
fn group_by_target(patches: &[Patch]) -> Vec<(PathBuf, Vec<&Patch>)> {
    let mut groups: Vec<(PathBuf, Vec<&Patch>)> = Vec::new();
    for patch in patches {
        match groups.iter_mut().find(|(target, _)| *target == patch.target) {
            Some((_, queue)) => queue.push(patch),
            None => groups.push((patch.target.clone(), vec![patch])),
        }
    }
    groups
}

/// Enumerates the project's Rust sources. Only used for reporting and for
/// the run-fatal "cannot enumerate input files" check.
fn enumerate_sources(root: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut sources = Vec::new();
    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        name != "target" && name != ".git"
    });
    for entry in walker {
        let entry = entry.map_err(|_| EngineError::ProjectRoot {
            path: root.to_path_buf(),
        })?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "rs") {
            sources.push(entry.path().to_path_buf());
        }
    }
    Ok(sources)
}
