/*!
# Cursor (Navigator)

An immutable, chainable selection over a `SourceTree`. A cursor carries a
path of child indices from the root, a human-readable trail of the steps
taken, and a validity flag. Navigation never borrows the tree: the path is
resolved on demand, so cursors stay cheap to clone and survive re-parses of
identical text.

Validity is monotone. Every operation on an invalid cursor returns an
invalid cursor without raising, so a whole recipe short-circuits the moment
one selector misses and the failed step is available for the skip report.
*/

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::parser::{body_of, SourceTree};

/// Kind of named scope a `Selector::Scope` descends into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    #[default]
    Module,
    Impl,
}

/// One atomic navigation step. A closed set so every failure mode is
/// enumerable and testable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// Descend into `mod name { .. }` / `impl Name { .. }` among the
    /// current level's items.
    Scope {
        #[serde(default)]
        scope: ScopeKind,
        name: String,
    },
    /// Descend into `fn name(..)`, optionally requiring a parameter count.
    Function {
        name: String,
        #[serde(default)]
        arity: Option<usize>,
    },
    /// First call expression (pre-order) whose callee text equals `callee`.
    Call { callee: String },
    /// First pre-order branch whose source text contains `text`, tightened
    /// to the innermost node on that branch still containing it. The match
    /// is the narrowest node around the text, not the shallowest container,
    /// so line-level transforms anchor at the text itself.
    Pattern { text: String },
}

impl Selector {
    pub fn describe(&self) -> String {
        match self {
            Selector::Scope {
                scope: ScopeKind::Module,
                name,
            } => format!("mod `{name}`"),
            Selector::Scope {
                scope: ScopeKind::Impl,
                name,
            } => format!("impl `{name}`"),
            Selector::Function {
                name,
                arity: Some(arity),
            } => format!("fn `{name}/{arity}`"),
            Selector::Function { name, arity: None } => format!("fn `{name}`"),
            Selector::Call { callee } => format!("call to `{callee}`"),
            Selector::Pattern { text } => format!("pattern `{text}`"),
        }
    }
}

/// Result of a chain of selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    path: Vec<usize>,
    trail: Vec<String>,
    valid: bool,
}

impl Cursor {
    /// Cursor at the file root.
    pub fn root() -> Self {
        Self {
            path: Vec::new(),
            trail: Vec::new(),
            valid: true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub fn trail(&self) -> &[String] {
        &self.trail
    }

    /// The failed step, present only on invalid cursors.
    pub fn failure(&self) -> Option<&str> {
        if self.valid {
            None
        } else {
            self.trail.last().map(String::as_str)
        }
    }

    /// Resolves the cursor against a tree. `None` for invalid cursors and
    /// for paths that no longer exist in the tree.
    pub fn resolve<'t>(&self, tree: &'t SourceTree) -> Option<Node<'t>> {
        if !self.valid {
            return None;
        }
        tree.node_at(&self.path)
    }

    /// Applies one selector, returning the narrowed (or invalidated)
    /// cursor.
    pub fn apply(self, tree: &SourceTree, selector: &Selector) -> Cursor {
        if !self.valid {
            return self;
        }
        let Some(node) = tree.node_at(&self.path) else {
            return self.invalidate("cursor no longer resolves against the tree".to_string());
        };
        match selector {
            Selector::Scope { scope, name } => self.scope_step(tree, node, *scope, name),
            Selector::Function { name, arity } => self.function_step(tree, node, name, *arity),
            Selector::Call { callee } => {
                let found = search_call(tree, node, callee);
                self.narrow(selector, found)
            }
            Selector::Pattern { text } => {
                let found = search_pattern(tree, node, text);
                self.narrow(selector, found)
            }
        }
    }

    /// Descends into a module- or impl-like scope at the current level.
    pub fn enter_named_scope(self, tree: &SourceTree, kind: ScopeKind, name: &str) -> Cursor {
        self.apply(
            tree,
            &Selector::Scope {
                scope: kind,
                name: name.to_string(),
            },
        )
    }

    /// Descends into a function definition at the current level.
    pub fn enter_function(self, tree: &SourceTree, name: &str, arity: Option<usize>) -> Cursor {
        self.apply(
            tree,
            &Selector::Function {
                name: name.to_string(),
                arity,
            },
        )
    }

    /// Pre-order search for the first descendant the selector matches.
    pub fn find_first(self, tree: &SourceTree, selector: &Selector) -> Cursor {
        self.apply(tree, selector)
    }

    fn scope_step(self, tree: &SourceTree, node: Node<'_>, kind: ScopeKind, name: &str) -> Cursor {
        let selector = Selector::Scope {
            scope: kind,
            name: name.to_string(),
        };
        let Some(level) = body_of(node) else {
            return self.miss(&selector);
        };
        let mut relative = Vec::new();
        if level.id() != node.id() {
            match child_index(node, level) {
                Some(index) => relative.push(index),
                None => return self.miss(&selector),
            }
        }
        for index in 0..level.child_count() {
            let Some(child) = level.child(index) else {
                continue;
            };
            let hit = match kind {
                ScopeKind::Module => {
                    child.kind() == "mod_item" && field_text(tree, child, "name") == Some(name)
                }
                ScopeKind::Impl => {
                    child.kind() == "impl_item" && field_text(tree, child, "type") == Some(name)
                }
            };
            if hit {
                relative.push(index);
                return self.descend(relative, selector.describe());
            }
        }
        self.miss(&selector)
    }

    fn function_step(
        self,
        tree: &SourceTree,
        node: Node<'_>,
        name: &str,
        arity: Option<usize>,
    ) -> Cursor {
        let selector = Selector::Function {
            name: name.to_string(),
            arity,
        };
        let Some(level) = body_of(node) else {
            return self.miss(&selector);
        };
        let mut relative = Vec::new();
        if level.id() != node.id() {
            match child_index(node, level) {
                Some(index) => relative.push(index),
                None => return self.miss(&selector),
            }
        }
        for index in 0..level.child_count() {
            let Some(child) = level.child(index) else {
                continue;
            };
            if child.kind() != "function_item" || field_text(tree, child, "name") != Some(name) {
                continue;
            }
            if let Some(expected) = arity {
                if function_arity(child) != Some(expected) {
                    continue;
                }
            }
            relative.push(index);
            return self.descend(relative, selector.describe());
        }
        self.miss(&selector)
    }

    fn narrow(self, selector: &Selector, found: Option<Vec<usize>>) -> Cursor {
        match found {
            Some(relative) => self.descend(relative, selector.describe()),
            None => self.miss(selector),
        }
    }

    fn descend(mut self, relative: Vec<usize>, step: String) -> Cursor {
        self.path.extend(relative);
        self.trail.push(step);
        self
    }

    fn miss(self, selector: &Selector) -> Cursor {
        let context = self
            .trail
            .last()
            .cloned()
            .unwrap_or_else(|| "file root".to_string());
        self.invalidate(format!("{} not found under {}", selector.describe(), context))
    }

    fn invalidate(mut self, step: String) -> Cursor {
        self.trail.push(step);
        self.valid = false;
        self
    }
}

fn field_text<'t>(tree: &'t SourceTree, node: Node<'t>, field: &str) -> Option<&'t str> {
    node.child_by_field_name(field).map(|n| tree.node_text(n))
}

fn child_index(parent: Node<'_>, target: Node<'_>) -> Option<usize> {
    (0..parent.child_count()).find(|&i| parent.child(i).map_or(false, |c| c.id() == target.id()))
}

/// Parameter count of a `function_item`, counting `self` as one parameter.
fn function_arity(node: Node<'_>) -> Option<usize> {
    let params = node.child_by_field_name("parameters")?;
    let mut count = 0;
    for index in 0..params.named_child_count() {
        if let Some(param) = params.named_child(index) {
            if matches!(param.kind(), "parameter" | "self_parameter") {
                count += 1;
            }
        }
    }
    Some(count)
}

fn is_call_to(tree: &SourceTree, node: Node<'_>, callee: &str) -> bool {
    node.kind() == "call_expression" && field_text(tree, node, "function") == Some(callee)
}

/// Pre-order search for the first call expression to `callee`. Returns the
/// child-index path relative to `node`.
fn search_call(tree: &SourceTree, node: Node<'_>, callee: &str) -> Option<Vec<usize>> {
    for index in 0..node.child_count() {
        let Some(child) = node.child(index) else {
            continue;
        };
        if is_call_to(tree, child, callee) {
            return Some(vec![index]);
        }
        if let Some(mut deeper) = search_call(tree, child, callee) {
            deeper.insert(0, index);
            return Some(deeper);
        }
    }
    None
}

/// Pre-order search for the first subtree containing `text`, tightened to
/// the innermost node on that branch still containing it.
fn search_pattern(tree: &SourceTree, node: Node<'_>, text: &str) -> Option<Vec<usize>> {
    for index in 0..node.child_count() {
        let Some(child) = node.child(index) else {
            continue;
        };
        if !tree.node_text(child).contains(text) {
            continue;
        }
        let mut path = vec![index];
        let mut current = child;
        loop {
            let tighter = (0..current.child_count()).find_map(|i| {
                current
                    .child(i)
                    .filter(|c| tree.node_text(*c).contains(text))
                    .map(|c| (i, c))
            });
            match tighter {
                Some((i, c)) => {
                    path.push(i);
                    current = c;
                }
                None => return Some(path),
            }
        }
    }
    None
}

/// True when the node or any of its descendants is a call to `callee`.
/// Used by idempotency checks.
pub(crate) fn subtree_contains_call(tree: &SourceTree, node: Node<'_>, callee: &str) -> bool {
    is_call_to(tree, node, callee) || search_call(tree, node, callee).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = concat!(
        "mod demo {\n",
        "    fn init(cfg: u32) {\n",
        "        configure(cfg);\n",
        "    }\n",
        "\n",
        "    fn shutdown() {}\n",
        "}\n",
    );

    fn sample_tree() -> SourceTree {
        SourceTree::parse(SAMPLE).unwrap()
    }

    fn module(name: &str) -> Selector {
        Selector::Scope {
            scope: ScopeKind::Module,
            name: name.to_string(),
        }
    }

    fn function(name: &str, arity: Option<usize>) -> Selector {
        Selector::Function {
            name: name.to_string(),
            arity,
        }
    }

    #[test]
    fn enters_module_then_function_then_call() {
        let tree = sample_tree();
        let cursor = Cursor::root()
            .apply(&tree, &module("demo"))
            .apply(&tree, &function("init", Some(1)))
            .apply(
                &tree,
                &Selector::Call {
                    callee: "configure".to_string(),
                },
            );
        assert!(cursor.is_valid());
        let node = cursor.resolve(&tree).unwrap();
        assert_eq!(tree.node_text(node), "configure(cfg)");
        assert_eq!(
            cursor.trail(),
            ["mod `demo`", "fn `init/1`", "call to `configure`"]
        );
    }

    #[test]
    fn arity_mismatch_misses() {
        let tree = sample_tree();
        let cursor = Cursor::root()
            .apply(&tree, &module("demo"))
            .apply(&tree, &function("init", Some(2)));
        assert!(!cursor.is_valid());
        assert_eq!(
            cursor.failure(),
            Some("fn `init/2` not found under mod `demo`")
        );
    }

    #[test]
    fn missing_scope_names_file_root() {
        let tree = sample_tree();
        let cursor = Cursor::root().apply(&tree, &module("absent"));
        assert_eq!(
            cursor.failure(),
            Some("mod `absent` not found under file root")
        );
    }

    #[test]
    fn invalid_cursor_short_circuits_every_downstream_step() {
        let tree = sample_tree();
        let failed = Cursor::root().apply(&tree, &module("absent"));
        let downstream = failed
            .clone()
            .apply(&tree, &function("init", None))
            .apply(
                &tree,
                &Selector::Call {
                    callee: "configure".to_string(),
                },
            );
        assert!(!downstream.is_valid());
        // no new trail entries: downstream steps are strict no-ops
        assert_eq!(downstream.trail(), failed.trail());
    }

    #[test]
    fn pattern_search_tightens_to_innermost_node() {
        let tree = sample_tree();
        let cursor = Cursor::root().apply(
            &tree,
            &Selector::Pattern {
                text: "cfg".to_string(),
            },
        );
        let node = cursor.resolve(&tree).unwrap();
        assert_eq!(tree.node_text(node), "cfg");
    }

    #[test]
    fn call_search_is_deterministic_preorder() {
        let source = "fn a() { t(); }\nfn b() { t(); }\n";
        let tree = SourceTree::parse(source).unwrap();
        let cursor = Cursor::root().apply(
            &tree,
            &Selector::Call {
                callee: "t".to_string(),
            },
        );
        let node = cursor.resolve(&tree).unwrap();
        // the match inside `a`, not `b`
        assert!(node.start_byte() < source.find("fn b").unwrap());
    }

    #[test]
    fn named_wrappers_mirror_selector_application() {
        let tree = sample_tree();
        let via_wrappers = Cursor::root()
            .enter_named_scope(&tree, ScopeKind::Module, "demo")
            .enter_function(&tree, "init", Some(1))
            .find_first(
                &tree,
                &Selector::Call {
                    callee: "configure".to_string(),
                },
            );
        let via_apply = Cursor::root()
            .apply(&tree, &module("demo"))
            .apply(&tree, &function("init", Some(1)))
            .apply(
                &tree,
                &Selector::Call {
                    callee: "configure".to_string(),
                },
            );
        assert_eq!(via_wrappers, via_apply);
    }

    #[test]
    fn function_without_arity_requirement_matches_any() {
        let tree = sample_tree();
        let cursor = Cursor::root()
            .apply(&tree, &module("demo"))
            .apply(&tree, &function("shutdown", None));
        assert!(cursor.is_valid());
    }

    #[test]
    fn subtree_call_detection() {
        let tree = sample_tree();
        let cursor = Cursor::root()
            .apply(&tree, &module("demo"))
            .apply(&tree, &function("init", Some(1)));
        let node = cursor.resolve(&tree).unwrap();
        assert!(subtree_contains_call(&tree, node, "configure"));
        assert!(!subtree_contains_call(&tree, node, "teardown"));
    }

    #[test]
    fn selector_round_trips_through_toml() {
        let raw = r#"
            kind = "function"
            name = "main"
            arity = 0
        "#;
        let selector: Selector = toml::from_str(raw).unwrap();
        assert_eq!(selector, function("main", Some(0)));
    }
}
