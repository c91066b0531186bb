/*!
# Error System for Patchsmith

Engine-internal error taxonomy. Errors raised during patch evaluation are
converted into patch outcomes by the executor and never abort the run; the
only run-fatal variants are the ones produced before any patch is attempted
(plan loading, project enumeration).
*/

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The source file contains syntax the grammar cannot accept.
    /// File-scoped: fails every patch queued for that file, nothing else.
    #[error("syntax error at line {line}, column {column}")]
    Parse { line: usize, column: usize },

    /// A transform spliced a fragment that left the file unparseable,
    /// or the cursor no longer resolves against the current tree.
    #[error("transform produced invalid source: {details}")]
    Transform { details: String },

    /// Template rendering failed (unresolved placeholder and similar).
    #[error("template error: {details}")]
    Template { details: String },

    /// Destination file or directory could not be written.
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Plan file is missing or malformed. Run-fatal.
    #[error("invalid plan: {details}")]
    Plan { details: String },

    /// Project root could not be enumerated. Run-fatal.
    #[error("project root {path} is not a usable directory")]
    ProjectRoot { path: PathBuf },
}

impl EngineError {
    pub fn transform(details: impl Into<String>) -> Self {
        EngineError::Transform {
            details: details.into(),
        }
    }

    pub fn template(details: impl Into<String>) -> Self {
        EngineError::Template {
            details: details.into(),
        }
    }

    pub fn plan(details: impl Into<String>) -> Self {
        EngineError::Plan {
            details: details.into(),
        }
    }

    /// True for errors that abort the whole run instead of being folded
    /// into a per-patch outcome.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Plan { .. } | EngineError::ProjectRoot { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(EngineError::plan("missing").is_fatal());
        assert!(EngineError::ProjectRoot {
            path: PathBuf::from("/nope")
        }
        .is_fatal());
        assert!(!EngineError::transform("bad splice").is_fatal());
        assert!(!EngineError::Parse { line: 1, column: 1 }.is_fatal());
    }

    #[test]
    fn display_carries_position() {
        let err = EngineError::Parse { line: 4, column: 7 };
        assert_eq!(err.to_string(), "syntax error at line 4, column 7");
    }
}
