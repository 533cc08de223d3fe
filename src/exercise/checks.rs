#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Locating answers in a submission's stdout, and the text-level fallback
//! checks used when an answer is printed as a pandas table instead of a
//! Python literal.

use regex::Regex;

use crate::python::Tolerance;

/// Returns the first non-empty line after the first line equal to `header`
/// (both compared trimmed), or `None` if either is absent.
pub fn answer_after_header<'a>(stdout: &'a str, header: &str) -> Option<&'a str> {
    let header = header.trim();
    let mut lines = stdout.lines();
    lines.find(|line| line.trim() == header)?;
    lines.map(str::trim).find(|line| !line.is_empty())
}

/// Which part of stdout a fallback looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// All of stdout.
    Whole,
    /// Everything after the first occurrence of this text, or all of stdout
    /// when the text is not printed.
    After(String),
}

impl Scope {
    /// Narrows `stdout` to this scope.
    pub fn slice<'a>(&self, stdout: &'a str) -> &'a str {
        match self {
            Scope::Whole => stdout,
            Scope::After(marker) => stdout
                .split_once(marker.as_str())
                .map_or(stdout, |(_, rest)| rest),
        }
    }
}

/// A table row as pandas prints it: a label followed by numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Token that must appear on the line (index label or cell value).
    label:  String,
    /// Numbers that must follow the label, in order.
    values: Vec<f64>,
}

impl TableRow {
    /// Creates a new row expectation.
    pub fn new(label: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            label:  label.into(),
            values: values.into_iter().collect(),
        }
    }

    /// Label token.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Expected numbers.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns true if `line` contains the label as a whitespace token and the
    /// expected numbers appear, in order, among the numeric tokens after it.
    pub fn matches_line(&self, line: &str, tolerance: &Tolerance) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| **token == self.label)
            .any(|(idx, _)| {
                let mut numbers = tokens[idx + 1..].iter().filter_map(|t| parse_number(t));
                self.values
                    .iter()
                    .all(|want| numbers.any(|got| tolerance.accepts(*want, got)))
            })
    }

    /// Index of the first line of `text` matching this row.
    pub fn first_match(&self, text: &str, tolerance: &Tolerance) -> Option<usize> {
        text.lines()
            .position(|line| self.matches_line(line, tolerance))
    }
}

/// Parses a printed cell as a number, ignoring a trailing comma.
fn parse_number(token: &str) -> Option<f64> {
    token
        .trim_end_matches(',')
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// One condition over the scoped text.
#[derive(Debug, Clone)]
pub enum Check {
    /// Some line matches the row.
    Row(TableRow),
    /// Every row matches, and their first matches appear in this order.
    OrderedRows(Vec<TableRow>),
    /// The pattern matches somewhere.
    Pattern(Regex),
}

impl Check {
    /// Evaluates the check over `text`.
    pub fn holds(&self, text: &str, tolerance: &Tolerance) -> bool {
        match self {
            Check::Row(row) => row.first_match(text, tolerance).is_some(),
            Check::OrderedRows(rows) => {
                let mut previous: Option<usize> = None;
                for row in rows {
                    match row.first_match(text, tolerance) {
                        Some(line) if previous.is_none_or(|p| p < line) => previous = Some(line),
                        _ => return false,
                    }
                }
                true
            }
            Check::Pattern(pattern) => pattern.is_match(text),
        }
    }
}

/// A set of checks that must all hold within a scope.
#[derive(Debug, Clone)]
pub struct Fallback {
    /// Part of stdout the checks look at.
    scope:  Scope,
    /// Conditions, all required.
    checks: Vec<Check>,
}

impl Fallback {
    /// Creates a new fallback.
    pub fn new(scope: Scope, checks: Vec<Check>) -> Self {
        Self { scope, checks }
    }

    /// Scope of the checks.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The checks.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    /// Returns true if every check holds. A fallback without checks never
    /// accepts.
    pub fn accepts(&self, stdout: &str, tolerance: &Tolerance) -> bool {
        let text = self.scope.slice(stdout);
        !self.checks.is_empty() && self.checks.iter().all(|c| c.holds(text, tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUPED: &str = "\
✅ Sorted Result:
      num_orders  total_spent
name
Alice           2        250.0
Bob             1          200
";

    #[test]
    fn answer_is_the_next_non_empty_line() {
        let stdout = "✅ Joined Result:\n\n  [1, 2]  \nnext\n";
        assert_eq!(answer_after_header(stdout, "✅ Joined Result:"), Some("[1, 2]"));
        assert_eq!(answer_after_header(stdout, "🏆 Top User:"), None);
        assert_eq!(answer_after_header("🏆 Top User:\n\n", "🏆 Top User:"), None);
    }

    #[test]
    fn rows_match_with_tolerance() {
        let tol = Tolerance::new(1e-6, 0.0);
        assert!(TableRow::new("Alice", [2.0, 250.0]).first_match(GROUPED, &tol).is_some());
        assert!(TableRow::new("Alice", [250.0]).first_match(GROUPED, &tol).is_some());
        assert!(TableRow::new("Alice", [250.0000001]).first_match(GROUPED, &tol).is_some());
        assert!(TableRow::new("Alice", [251.0]).first_match(GROUPED, &tol).is_none());
        assert!(TableRow::new("Alice", [250.0, 2.0]).first_match(GROUPED, &tol).is_none());
        assert!(TableRow::new("Carol", []).first_match(GROUPED, &tol).is_none());
    }

    #[test]
    fn ordered_rows_respect_order() {
        let tol = Tolerance::EXACT;
        let alice = TableRow::new("Alice", [2.0, 250.0]);
        let bob = TableRow::new("Bob", [1.0, 200.0]);
        assert!(Check::OrderedRows(vec![alice.clone(), bob.clone()]).holds(GROUPED, &tol));
        assert!(!Check::OrderedRows(vec![bob, alice]).holds(GROUPED, &tol));
    }

    #[test]
    fn scope_narrows_to_text_after_marker() {
        let stdout = "Bob 1 200\nmarker\nAlice 2 250\n";
        let fallback = Fallback::new(
            Scope::After("marker".into()),
            vec![Check::Row(TableRow::new("Bob", [1.0, 200.0]))],
        );
        assert!(!fallback.accepts(stdout, &Tolerance::EXACT));
        assert!(fallback.accepts("Bob 1 200\n", &Tolerance::EXACT));
    }

    #[test]
    fn patterns_and_empty_fallbacks() {
        let pattern = Check::Pattern(Regex::new(r"(?i)Name:\s*Alice").unwrap());
        assert!(pattern.holds("total_spent 250\nName: Alice, dtype: int64", &Tolerance::EXACT));
        assert!(!Fallback::new(Scope::Whole, vec![]).accepts("anything", &Tolerance::EXACT));
    }
}
