/*!
# Core Module

Shared foundations for the patch engine: the error taxonomy and the
outcome/result types every other module reports through.
*/

pub mod errors;
pub mod results;

pub use errors::EngineError;
pub use results::{
    FileReport, OutcomeTotals, PatchOutcome, PatchRecord, RunMetadata, RunResult, ScaffoldOutcome,
    ScaffoldRecord,
};
