/*!
# Tree Parser/Printer

Wraps tree-sitter parsing of Rust sources behind the `SourceTree` type.

A `SourceTree` owns the file text and its parse tree and is never mutated:
every edit splices replacement bytes into a copy of the text and re-parses.
Printing returns the owned text, so `print(parse(t)) == t` holds exactly
for any untouched input, and edits preserve the formatting of every region
they do not splice.
*/

use tree_sitter::{Node, Parser, Tree};

use crate::core::EngineError;

/// Immutable parse result for one file.
#[derive(Clone)]
pub struct SourceTree {
    text: String,
    tree: Tree,
}

impl std::fmt::Debug for SourceTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceTree")
            .field("bytes", &self.text.len())
            .field("root", &self.tree.root_node().kind())
            .finish()
    }
}

impl SourceTree {
    /// Parses `text`. A tree containing ERROR or MISSING nodes counts as a
    /// parse failure; patching a half-parsed file risks splicing at wrong
    /// byte ranges.
    pub fn parse(text: impl Into<String>) -> Result<Self, EngineError> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_rust::language())
            .map_err(|e| EngineError::plan(format!("grammar rejected by parser: {e}")))?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| EngineError::Parse { line: 1, column: 1 })?;

        if tree.root_node().has_error() {
            let (line, column) = first_error(tree.root_node())
                .map(|node| {
                    let point = node.start_position();
                    (point.row + 1, point.column + 1)
                })
                .unwrap_or((1, 1));
            return Err(EngineError::Parse { line, column });
        }

        Ok(Self { text, tree })
    }

    /// Serializes the tree back to source text.
    pub fn print(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Resolves a path of child indices from the root.
    pub fn node_at(&self, path: &[usize]) -> Option<Node<'_>> {
        let mut node = self.root();
        for &index in path {
            node = node.child(index)?;
        }
        Some(node)
    }

    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.text[node.byte_range()]
    }

    /// Whitespace prefix of the line containing `byte`.
    pub(crate) fn line_indent_at(&self, byte: usize) -> &str {
        let line_start = self.text[..byte].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line = &self.text[line_start..];
        let indent_len = line
            .char_indices()
            .find(|(_, c)| *c != ' ' && *c != '\t')
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        &line[..indent_len]
    }

    /// Replaces the node's source range with `fragment`.
    pub fn replace_node(&self, node: Node<'_>, fragment: &str) -> Result<SourceTree, EngineError> {
        self.splice(node.start_byte(), node.end_byte(), fragment)
    }

    /// Inserts `fragment` as a line of its own directly above the node,
    /// reusing the node's indentation.
    pub fn insert_before_node(
        &self,
        node: Node<'_>,
        fragment: &str,
    ) -> Result<SourceTree, EngineError> {
        let anchor = line_anchor(node);
        let indent = self.line_indent_at(anchor.start_byte());
        let insertion = format!("{fragment}\n{indent}");
        self.splice(anchor.start_byte(), anchor.start_byte(), &insertion)
    }

    /// Inserts `fragment` as a line of its own directly below the node.
    pub fn insert_after_node(
        &self,
        node: Node<'_>,
        fragment: &str,
    ) -> Result<SourceTree, EngineError> {
        let anchor = line_anchor(node);
        let indent = self.line_indent_at(anchor.start_byte());
        let insertion = format!("\n{indent}{fragment}");
        self.splice(anchor.end_byte(), anchor.end_byte(), &insertion)
    }

    /// Appends `fragment` as the last item inside the node's body
    /// (function block, module or impl declaration list).
    pub fn append_child_node(
        &self,
        node: Node<'_>,
        fragment: &str,
    ) -> Result<SourceTree, EngineError> {
        let body = body_of(node).ok_or_else(|| {
            EngineError::transform(format!("`{}` node cannot take children", node.kind()))
        })?;

        if let Some(last) = last_named_child(body) {
            let indent = self.line_indent_at(last.start_byte());
            let insertion = format!("\n{indent}{fragment}");
            return self.splice(last.end_byte(), last.end_byte(), &insertion);
        }

        // Empty body: splice right before the closing brace.
        let closing = body
            .child(body.child_count().saturating_sub(1))
            .filter(|c| c.kind() == "}")
            .ok_or_else(|| EngineError::transform("body has no closing brace"))?;
        let base = self.line_indent_at(node.start_byte());
        let insertion = format!("\n{base}    {fragment}\n{base}");
        self.splice(closing.start_byte(), closing.start_byte(), &insertion)
    }

    fn splice(&self, start: usize, end: usize, insertion: &str) -> Result<SourceTree, EngineError> {
        let mut edited = String::with_capacity(self.text.len() + insertion.len());
        edited.push_str(&self.text[..start]);
        edited.push_str(insertion);
        edited.push_str(&self.text[end..]);
        SourceTree::parse(edited)
            .map_err(|e| EngineError::transform(format!("edited source no longer parses: {e}")))
    }
}

/// Body node searched when descending into or appending under an item.
pub(crate) fn body_of(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "mod_item" | "impl_item" | "function_item" => node.child_by_field_name("body"),
        "declaration_list" | "block" | "source_file" => Some(node),
        _ => None,
    }
}

/// Widens a node to its outermost ancestor below the enclosing block or
/// item list, so line-level inserts take the whole statement with them
/// instead of splicing mid-line (a cursor on `foo()` inside
/// `let x = foo();` anchors at the `let`).
fn line_anchor(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while let Some(parent) = current.parent() {
        match parent.kind() {
            "block" | "declaration_list" | "field_declaration_list" | "enum_variant_list"
            | "match_block" | "source_file" => break,
            _ => current = parent,
        }
    }
    current
}

fn last_named_child(node: Node<'_>) -> Option<Node<'_>> {
    let count = node.named_child_count();
    if count == 0 {
        None
    } else {
        node.named_child(count - 1)
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut walk = node.walk();
    for child in node.children(&mut walk) {
        if let Some(found) = first_error(child) {
            return Some(found);
        }
    }
    None
}
