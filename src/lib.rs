/*!
# Patchsmith

Idempotent source-patching engine for wiring libraries into existing Rust
projects. A plan file describes *what* to find and *what* to insert; the
engine parses each target file into a tree, navigates to the right node via
a chain of semantic selectors, checks whether the change is already
present, applies it if safe, and writes the file back without disturbing
any untouched formatting. Re-running a plan is always a no-op.

## Architecture

```text
Patchsmith
├── parser     - tree-sitter SourceTree, exact printing, splice edits
├── cursor     - chainable navigation with validity short-circuit
├── patch      - declarative patch values (recipe, idempotency, transform)
├── executor   - per-(file, patch) state machine → outcome
├── runner     - whole-run orchestration, outcome + dependency aggregation
├── scaffold   - templated file creation
├── plan       - TOML plan files (the external patch catalogue)
├── reports    - text and JSON run reports
└── core       - error taxonomy and result types
```

## Outcome contract

Every patch application terminates in exactly one of `Applied`,
`AlreadyApplied`, `Skipped(reason)` or `Failed(reason)`. All four are valid
results of a correct run; reasons double as operator remediation text. No
error raised during patch evaluation aborts the run.

## Usage

```no_run
use patchsmith::{Plan, RunConfig, Runner, TextReporter};

let plan = Plan::load("telemetry.plan.toml".as_ref())?;
let runner = Runner::new(RunConfig::default());
let result = runner.run(&plan)?;
println!("{}", TextReporter::plain().render(&result));
println!("new dependencies: {:?}", result.dependencies());
# Ok::<(), patchsmith::EngineError>(())
```
*/

pub mod core;
pub mod cursor;
pub mod executor;
pub mod parser;
pub mod patch;
pub mod plan;
pub mod reports;
pub mod runner;
pub mod scaffold;

pub use crate::core::{
    EngineError, FileReport, OutcomeTotals, PatchOutcome, PatchRecord, RunResult, ScaffoldOutcome,
};
pub use cursor::{Cursor, ScopeKind, Selector};
pub use executor::PatchExecutor;
pub use parser::SourceTree;
pub use patch::{IdempotencyCheck, Patch, Transform};
pub use plan::Plan;
pub use reports::{JsonReporter, ReportFormat, TextReporter};
pub use runner::{RunConfig, Runner};
pub use scaffold::ScaffoldRequest;

use std::path::Path;

/// Loads a plan and applies it in one call.
pub fn apply_plan(plan_path: &Path, config: RunConfig) -> Result<RunResult, EngineError> {
    let plan = Plan::load(plan_path)?;
    Runner::new(config).run(&plan)
}
