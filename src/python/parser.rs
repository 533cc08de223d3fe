#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Tree-sitter parser wrapper for Python submissions.

use std::{collections::BTreeSet, fmt::Formatter};

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Language, Node, Query, QueryCursor, StreamingIterator, Tree};

use super::queries::BOUND_NAMES_QUERY;

/// A struct that wraps a tree-sitter parse tree and the source it came from.
#[derive(Clone)]
pub struct Parser {
    /// The source code being parsed.
    code: String,
    /// The parse tree.
    tree: Tree,
    /// The tree-sitter Python grammar language.
    lang: Language,
}

/// Returns the compiled tree-sitter Python language.
fn python_language() -> Language {
    tree_sitter_python::LANGUAGE.into()
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("lines", &self.line_count())
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Returns a new parser object.
    ///
    /// * `source_code`: the source code to be parsed
    pub fn new(source_code: String) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        let language = python_language();

        parser
            .set_language(&language)
            .with_context(|| "Failed to load Python grammar")?;
        let tree = parser
            .parse(source_code.as_str(), None)
            .ok_or_else(|| anyhow!("Error parsing Python code"))?;

        Ok(Self {
            code: source_code,
            tree,
            lang: language,
        })
    }

    /// A getter for parser's source code.
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the parse tree's root node.
    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Returns the 1-based line of the first syntax error, if any.
    pub fn first_error_line(&self) -> Option<usize> {
        let root = self.root_node();
        if !root.has_error() {
            return None;
        }

        let mut cursor = root.walk();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if node.is_error() || node.is_missing() {
                return Some(node.start_position().row + 1);
            }
            if !node.has_error() {
                continue;
            }
            // push in reverse so the leftmost child is visited first
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }

        Some(root.start_position().row + 1)
    }

    /// Returns every node captured as `capture_name` by the supplied query, in
    /// source order.
    pub fn query_nodes(&self, q: &str, capture_name: &str) -> Result<Vec<Node<'_>>> {
        let query = Query::new(&self.lang, q)
            .with_context(|| format!("Failed to compile tree-sitter query: {q}"))?;
        let capture_index = query
            .capture_index_for_name(capture_name)
            .ok_or_else(|| anyhow!("Capture name {capture_name} not present in query"))?;

        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.tree.root_node(), self.code.as_bytes());
        let mut results = Vec::new();

        while let Some(m) = matches.next() {
            results.extend(
                m.captures
                    .iter()
                    .filter(|c| c.index == capture_index)
                    .map(|c| c.node),
            );
        }

        Ok(results)
    }

    /// Returns the text of every capture named `capture_name` in the supplied
    /// query, in source order.
    pub fn query_captures(&self, q: &str, capture_name: &str) -> Result<Vec<String>> {
        self.query_nodes(q, capture_name)?
            .into_iter()
            .map(|node| self.node_text(node))
            .collect()
    }

    /// Source text of `node`.
    fn node_text(&self, node: Node<'_>) -> Result<String> {
        Ok(node
            .utf8_text(self.code.as_bytes())
            .context("Cannot map capture to source text")?
            .to_string())
    }

    /// Adds the identifiers of a destructuring target to `names`, descending
    /// into nested patterns but not into subscripts or attributes.
    fn pattern_names(&self, node: Node<'_>, names: &mut BTreeSet<String>) -> Result<()> {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "identifier" => {
                    names.insert(self.node_text(child)?);
                }
                "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern" => {
                    self.pattern_names(child, names)?
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns every name the module binds: assignment targets (including
    /// destructuring), loop variables, `with` targets, functions, classes and
    /// imports.
    pub fn bound_names(&self) -> Result<BTreeSet<String>> {
        let mut names: BTreeSet<String> = self
            .query_captures(BOUND_NAMES_QUERY, "name")?
            .into_iter()
            .collect();
        for target in self.query_nodes(BOUND_NAMES_QUERY, "target")? {
            self.pattern_names(target, &mut names)?;
        }
        Ok(names)
    }

    /// Returns the total number of lines in the source code.
    pub fn line_count(&self) -> usize {
        self.code.lines().count()
    }
}
