#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The list-processing exercise: join users with orders, group, sort, and
//! pick the top spender using only built-in Python data structures.
//!
//! Answers are compared exactly ([`Tolerance::EXACT`]): every expected value
//! is integral, and a list result must match element for element.

use super::{Exercise, Question, TestCase};
use crate::{
    constants::{GROUPED_HEADER, JOINED_HEADER, SORTED_HEADER, TOP_USER_HEADER},
    python::{Tolerance, Value},
};

/// Name of the exercise, also the submission file suffix.
pub const NAME: &str = "python_list";

/// Builds a string value.
fn s(text: &str) -> Value {
    Value::Str(text.to_string())
}

/// `{"num_orders": n, "total_spent": t}`
pub(crate) fn summary(num_orders: i64, total_spent: i64) -> Value {
    Value::dict(vec![
        (s("num_orders"), Value::Int(num_orders)),
        (s("total_spent"), Value::Int(total_spent)),
    ])
}

/// `[{"name": "Alice", "total": 100}, ...]`
pub(crate) fn expected_joined() -> Value {
    let row = |name: &str, total: i64| {
        Value::dict(vec![(s("name"), s(name)), (s("total"), Value::Int(total))])
    };
    Value::List(vec![row("Alice", 100), row("Alice", 150), row("Bob", 200)])
}

/// `{"Alice": {...}, "Bob": {...}}`
pub(crate) fn expected_grouped() -> Value {
    Value::dict(vec![(s("Alice"), summary(2, 250)), (s("Bob"), summary(1, 200))])
}

/// `[("Alice", {...}), ("Bob", {...})]`, descending by total spent.
pub(crate) fn expected_sorted() -> Value {
    Value::List(vec![
        Value::Tuple(vec![s("Alice"), summary(2, 250)]),
        Value::Tuple(vec![s("Bob"), summary(1, 200)]),
    ])
}

/// `("Alice", {...})`
pub(crate) fn expected_top_user() -> Value {
    Value::Tuple(vec![s("Alice"), summary(2, 250)])
}

/// A single exact-match case.
fn exact(expected: Value, points: f64) -> TestCase {
    TestCase::builder()
        .expected(expected)
        .points(points)
        .tolerance(Tolerance::EXACT)
        .build()
}

/// Builds the exercise.
pub fn exercise() -> Exercise {
    Exercise::builder()
        .name(NAME)
        .required_names(["joined", "grouped", "sorted_result", "top_user"])
        .questions(vec![
            Question::builder()
                .id("joined")
                .header(JOINED_HEADER)
                .cases(vec![exact(expected_joined(), 15.0)])
                .build(),
            Question::builder()
                .id("grouped")
                .header(GROUPED_HEADER)
                .cases(vec![exact(expected_grouped(), 30.0)])
                .build(),
            Question::builder()
                .id("sorted_result")
                .header(SORTED_HEADER)
                .cases(vec![exact(expected_sorted(), 15.0)])
                .build(),
            Question::builder()
                .id("top_user")
                .header(TOP_USER_HEADER)
                .cases(vec![exact(expected_top_user(), 10.0)])
                .build(),
        ])
        .build()
}
