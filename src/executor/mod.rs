/*!
# Patch Executor

Applies one patch to one file's current tree and classifies the outcome:

```text
Start → resolve recipe   (invalid cursor → Skipped)
      → idempotency      (effect present → AlreadyApplied)
      → transform        (splice/reparse error → Failed)
      → Applied
```

Every failure is folded into an outcome; nothing raised during patch
evaluation escapes this module. The returned tree is the input for the next
patch queued on the same file.
*/

use tracing::{debug, warn};

use crate::core::PatchOutcome;
use crate::patch::Patch;
use crate::parser::SourceTree;

/// Stateless executor; one instance serves a whole run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatchExecutor;

impl PatchExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Runs the patch against `tree`. Returns the tree to use for the next
    /// patch (unchanged unless the outcome is `Applied`) and the outcome.
    pub fn apply(&self, tree: &SourceTree, patch: &Patch) -> (SourceTree, PatchOutcome) {
        let cursor = patch.resolve_recipe(tree);
        if !cursor.is_valid() {
            let reason = cursor
                .failure()
                .unwrap_or("recipe did not match")
                .to_string();
            debug!(label = %patch.label, %reason, "recipe dead-ended");
            return (tree.clone(), PatchOutcome::skipped(reason));
        }

        if patch.idempotency.is_satisfied(tree, &cursor) {
            debug!(label = %patch.label, "already applied");
            return (tree.clone(), PatchOutcome::AlreadyApplied);
        }

        match patch.transform.apply(tree, &cursor) {
            Ok(next) => {
                debug!(label = %patch.label, "applied");
                (next, PatchOutcome::Applied)
            }
            Err(err) => {
                warn!(label = %patch.label, error = %err, "transform failed");
                (tree.clone(), PatchOutcome::failed(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::{ScopeKind, Selector};
    use crate::patch::{IdempotencyCheck, Transform};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    const SAMPLE: &str = "mod m {\n    fn f(x: u32) {\n        setup(x);\n    }\n}\n";

    fn helper_patch(recipe: Vec<Selector>) -> Patch {
        Patch {
            label: "add helper call".to_string(),
            target: PathBuf::from("src/lib.rs"),
            recipe,
            idempotency: IdempotencyCheck::CallPresent {
                callee: "helper".to_string(),
            },
            transform: Transform::AppendChild {
                fragment: "helper();".to_string(),
            },
            dependencies: vec![],
        }
    }

    fn into_function() -> Vec<Selector> {
        vec![
            Selector::Scope {
                scope: ScopeKind::Module,
                name: "m".to_string(),
            },
            Selector::Function {
                name: "f".to_string(),
                arity: Some(1),
            },
        ]
    }

    #[test]
    fn applied_then_already_applied() {
        let executor = PatchExecutor::new();
        let tree = SourceTree::parse(SAMPLE).unwrap();
        let patch = helper_patch(into_function());

        let (patched, first) = executor.apply(&tree, &patch);
        assert_eq!(first, PatchOutcome::Applied);
        assert!(patched.print().contains("helper();"));

        let (unchanged, second) = executor.apply(&patched, &patch);
        assert_eq!(second, PatchOutcome::AlreadyApplied);
        assert_eq!(unchanged.print(), patched.print());
    }

    #[test]
    fn dead_recipe_is_skipped_with_reason() {
        let executor = PatchExecutor::new();
        let tree = SourceTree::parse(SAMPLE).unwrap();
        let mut recipe = into_function();
        recipe.push(Selector::Call {
            callee: "helper".to_string(),
        });
        let patch = helper_patch(recipe);

        let (unchanged, outcome) = executor.apply(&tree, &patch);
        assert_eq!(unchanged.print(), SAMPLE);
        assert_eq!(
            outcome,
            PatchOutcome::skipped("call to `helper` not found under fn `f/1`")
        );
    }

    #[test]
    fn broken_fragment_is_failed_not_raised() {
        let executor = PatchExecutor::new();
        let tree = SourceTree::parse(SAMPLE).unwrap();
        let mut patch = helper_patch(into_function());
        patch.transform = Transform::AppendChild {
            fragment: "fn ((( {".to_string(),
        };

        let (unchanged, outcome) = executor.apply(&tree, &patch);
        assert_eq!(unchanged.print(), SAMPLE);
        assert!(matches!(outcome, PatchOutcome::Failed { .. }));
    }
}
