#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The tabular exercise: the same join/group/sort/top-user pipeline written
//! with pandas DataFrames.
//!
//! Students may print either a Python literal or the DataFrame/Series itself,
//! so every case carries text fallbacks over the printed tables. Numbers are
//! compared with [`TOLERANCE`]: pandas prints `250` or `250.0` depending on
//! the dtype the student ends up with.

use regex::Regex;

use super::{Check, Exercise, Fallback, Question, Scope, TableRow, TestCase, python_list};
use crate::{
    constants::{GROUPED_HEADER, JOINED_HEADER, SORTED_HEADER, TOP_USER_HEADER},
    python::{Tolerance, Value},
};

/// Name of the exercise, also the submission file suffix.
pub const NAME: &str = "pandas";

/// Absolute 1e-6, relative 1e-9, for literal and table comparisons alike.
pub const TOLERANCE: Tolerance = Tolerance::new(1e-6, 1e-9);

/// Builds a case worth `points` that accepts `expected` or any fallback.
fn case(expected: Value, points: f64, fallbacks: Vec<Fallback>) -> TestCase {
    TestCase::builder()
        .expected(expected)
        .points(points)
        .tolerance(TOLERANCE)
        .fallbacks(fallbacks)
        .build()
}

/// The merged rows appear anywhere in stdout.
fn joined_fallback() -> Fallback {
    Fallback::new(
        Scope::Whole,
        vec![
            Check::Row(TableRow::new("Alice", [100.0])),
            Check::Row(TableRow::new("Alice", [150.0])),
            Check::Row(TableRow::new("Bob", [200.0])),
        ],
    )
}

/// The aggregate rows appear anywhere in stdout, in any order.
fn grouped_fallback() -> Fallback {
    Fallback::new(
        Scope::Whole,
        vec![
            Check::Row(TableRow::new("Alice", [2.0, 250.0])),
            Check::Row(TableRow::new("Bob", [1.0, 200.0])),
        ],
    )
}

/// Alice's aggregate row precedes Bob's after the sorted header.
fn sorted_fallback() -> Fallback {
    Fallback::new(
        Scope::After(SORTED_HEADER.to_string()),
        vec![Check::OrderedRows(vec![
            TableRow::new("Alice", [2.0, 250.0]),
            TableRow::new("Bob", [1.0, 200.0]),
        ])],
    )
}

/// A Series print named Alice with `total_spent 250`, after the top user
/// header.
fn top_user_fallback() -> Fallback {
    Fallback::new(
        Scope::After(TOP_USER_HEADER.to_string()),
        vec![
            Check::Pattern(
                Regex::new(r"(?i)Name:\s*Alice").expect("Top user name pattern must compile"),
            ),
            Check::Row(TableRow::new("total_spent", [250.0])),
        ],
    )
}

/// Builds the exercise.
pub fn exercise() -> Exercise {
    Exercise::builder()
        .name(NAME)
        .required_names(["df_users", "df_orders", "merged", "sorted_result", "top_user"])
        .packages(["pandas"])
        .questions(vec![
            Question::builder()
                .id("joined")
                .header(JOINED_HEADER)
                .cases(vec![case(python_list::expected_joined(), 5.0, vec![joined_fallback()])])
                .build(),
            Question::builder()
                .id("grouped")
                .header(GROUPED_HEADER)
                .cases(vec![case(python_list::expected_grouped(), 10.0, vec![grouped_fallback()])])
                .build(),
            Question::builder()
                .id("sorted_result")
                .header(SORTED_HEADER)
                .cases(vec![case(python_list::expected_sorted(), 20.0, vec![sorted_fallback()])])
                .build(),
            Question::builder()
                .id("top_user")
                .header(TOP_USER_HEADER)
                .cases(vec![case(python_list::expected_top_user(), 5.0, vec![top_user_fallback()])])
                .build(),
        ])
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// What the pandas template prints when completed.
    const PANDAS_STDOUT: &str = "\
✅ df_users:
   id   name
0   1  Alice
1   2    Bob

✅ Merged DataFrame:
   id   name  user_id  total
0   1  Alice        1    100
1   1  Alice        1    150
2   2    Bob        2    200

✅ Sorted Result:
       num_orders  total_spent
name
Alice           2          250
Bob             1          200

🏆 Top User:
num_orders       2
total_spent    250
Name: Alice, dtype: int64
";

    fn accepted(question: &str, stdout: &str) -> bool {
        let exercise = exercise();
        let question = exercise
            .questions()
            .iter()
            .find(|q| q.id() == question)
            .unwrap();
        let case = &question.cases()[0];
        case.fallbacks()
            .iter()
            .any(|f| f.accepts(stdout, case.tolerance()))
    }

    #[test]
    fn template_output_passes_every_fallback() {
        for question in ["joined", "grouped", "sorted_result", "top_user"] {
            assert!(accepted(question, PANDAS_STDOUT), "{question} should pass");
        }
    }

    #[test]
    fn top_user_fallback_needs_the_name_and_the_total() {
        let exercise = exercise();
        let top_user = exercise
            .questions()
            .iter()
            .find(|q| q.id() == "top_user")
            .unwrap();
        let fallbacks = top_user.cases()[0].fallbacks();
        assert_eq!(fallbacks.len(), 1);
        assert!(matches!(fallbacks[0].checks(), [Check::Pattern(_), Check::Row(_)]));

        let unnamed = PANDAS_STDOUT.replace("Name: Alice", "Name: Bob");
        assert!(!accepted("top_user", &unnamed));
        let wrong_total = PANDAS_STDOUT.replace("total_spent    250", "total_spent    200");
        assert!(!accepted("top_user", &wrong_total));
    }

    #[test]
    fn float_totals_within_tolerance_pass() {
        let stdout = PANDAS_STDOUT
            .replace("Alice           2          250", "Alice           2   250.0000001")
            .replace("total_spent    250", "total_spent    250.0");
        assert!(accepted("sorted_result", &stdout));
        assert!(accepted("top_user", &stdout));
    }

    #[test]
    fn wrong_sort_order_fails() {
        let stdout = PANDAS_STDOUT.replace(
            "Alice           2          250\nBob             1          200",
            "Bob             1          200\nAlice           2          250",
        );
        assert!(!accepted("sorted_result", &stdout));
        assert!(accepted("grouped", &stdout));
    }
}
