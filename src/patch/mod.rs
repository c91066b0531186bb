/*!
# Patch

The declarative unit of one source transformation: a label, a target file,
a navigation recipe, an idempotency predicate and a transform. Patches are
pure data; a plan file deserializes straight into them, so the catalogue of
concrete patches lives outside the engine.
*/

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::EngineError;
use crate::cursor::{subtree_contains_call, Cursor, Selector};
use crate::parser::SourceTree;

/// Predicate deciding whether a patch's effect is already present.
/// Evaluated against the cursor produced by the recipe, before the
/// transform runs, so re-running a whole plan is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum IdempotencyCheck {
    /// The patch is unconditionally (re)appliable. Meant for replace-style
    /// transforms whose output equals their input on a second run.
    #[default]
    None,
    /// Already applied when the file contains `text` anywhere. Document
    /// scope on purpose: a transform may insert its marker outside the
    /// subtree the recipe lands on.
    MarkerPresent { text: String },
    /// Already applied when the cursor subtree contains a call to `callee`.
    CallPresent { callee: String },
}

impl IdempotencyCheck {
    pub fn is_satisfied(&self, tree: &SourceTree, cursor: &Cursor) -> bool {
        match self {
            IdempotencyCheck::None => false,
            IdempotencyCheck::MarkerPresent { text } => tree.print().contains(text),
            IdempotencyCheck::CallPresent { callee } => cursor
                .resolve(tree)
                .map_or(false, |node| subtree_contains_call(tree, node, callee)),
        }
    }
}

/// Terminal mutation applied at the cursor. Fragments are literal Rust
/// source; inserted lines reuse the anchor node's indentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Transform {
    Replace { fragment: String },
    InsertBefore { fragment: String },
    InsertAfter { fragment: String },
    AppendChild { fragment: String },
}

impl Transform {
    /// Applies the mutation. An invalid cursor is a no-op that returns the
    /// tree unchanged.
    pub fn apply(&self, tree: &SourceTree, cursor: &Cursor) -> Result<SourceTree, EngineError> {
        let Some(node) = cursor.resolve(tree) else {
            return Ok(tree.clone());
        };
        match self {
            Transform::Replace { fragment } => tree.replace_node(node, fragment),
            Transform::InsertBefore { fragment } => tree.insert_before_node(node, fragment),
            Transform::InsertAfter { fragment } => tree.insert_after_node(node, fragment),
            Transform::AppendChild { fragment } => tree.append_child_node(node, fragment),
        }
    }
}

/// One declarative source patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Human-readable label, used as the report key.
    pub label: String,
    /// Project-relative path of the file this patch targets.
    pub target: PathBuf,
    /// Ordered selectors; the recipe reads as a declarative path.
    pub recipe: Vec<Selector>,
    #[serde(default)]
    pub idempotency: IdempotencyCheck,
    pub transform: Transform,
    /// Crate identifiers this patch introduces when applied.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Patch {
    /// Runs the navigation recipe from the file root.
    pub fn resolve_recipe(&self, tree: &SourceTree) -> Cursor {
        self.recipe
            .iter()
            .fold(Cursor::root(), |cursor, selector| cursor.apply(tree, selector))
    }
}
