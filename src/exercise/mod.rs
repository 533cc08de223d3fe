#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Exercise definitions: questions, their test cases and how printed answers
//! are checked.

/// Fallback checks over printed text.
pub mod checks;
/// Loading exercises from JSON files.
pub mod file;
/// The pandas (tabular) exercise.
pub mod pandas;
/// The plain Python list-processing exercise.
pub mod python_list;

use std::collections::HashSet;

use bon::Builder;

pub use checks::{Check, Fallback, Scope, TableRow, answer_after_header};

use crate::{
    constants::{PANDAS_OUTPUT, PANDAS_SRC_DIR, PYTHON_LIST_OUTPUT, PYTHON_LIST_SRC_DIR},
    python::{Tolerance, Value},
};

/// Errors raised when an exercise definition is unusable.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExerciseError {
    /// The exercise has no questions at all.
    #[error("Exercise `{0}` defines no questions")]
    NoQuestions(String),
    /// A question has an empty identifier.
    #[error("Exercise `{0}` has a question with an empty id")]
    EmptyId(String),
    /// Two questions share an identifier.
    #[error("Question `{0}` is defined more than once")]
    DuplicateQuestion(String),
    /// A question has no test cases.
    #[error("Question `{0}` has no test cases")]
    NoCases(String),
    /// A question's header line is blank.
    #[error("Question `{0}` has an empty header")]
    EmptyHeader(String),
    /// A test case is worth a negative or non-finite number of points.
    #[error("Question `{question}` has a test case worth {points} points")]
    InvalidPoints {
        /// Question the case belongs to.
        question: String,
        /// The offending value.
        points:   f64,
    },
}

/// One graded unit of a question: run with `stdin`, compare the printed
/// answer to `expected`.
#[derive(Debug, Clone, Builder)]
pub struct TestCase {
    /// Data written to the submission's stdin, if any.
    #[builder(into)]
    stdin:     Option<String>,
    /// The value the submission must print.
    expected:  Value,
    /// Points awarded when the case passes.
    points:    f64,
    /// Tolerance for float comparisons.
    #[builder(default)]
    tolerance: Tolerance,
    /// Alternative acceptance rules over the printed text.
    #[builder(default)]
    fallbacks: Vec<Fallback>,
}

impl TestCase {
    /// Data written to stdin.
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// Expected value.
    pub fn expected(&self) -> &Value {
        &self.expected
    }

    /// Points for passing.
    pub fn points(&self) -> f64 {
        self.points
    }

    /// Float tolerance.
    pub fn tolerance(&self) -> &Tolerance {
        &self.tolerance
    }

    /// Fallback acceptance rules.
    pub fn fallbacks(&self) -> &[Fallback] {
        &self.fallbacks
    }
}

/// A named part of an exercise, answered by printing a value after `header`.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct Question {
    /// Identifier, also used as the report column.
    id:     String,
    /// Line the submission prints right before its answer.
    header: String,
    /// Test cases, graded independently.
    #[builder(default)]
    cases:  Vec<TestCase>,
}

impl Question {
    /// Identifier and report column.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Header line.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Test cases in grading order.
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Sum of all case points.
    pub fn max_points(&self) -> f64 {
        self.cases.iter().map(TestCase::points).sum()
    }
}

/// A complete exercise: its questions and what a submission must define.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct Exercise {
    /// Name, also the expected file-name suffix (`{id}_{name}.py`).
    name:           String,
    /// Questions in report order.
    #[builder(default)]
    questions:      Vec<Question>,
    /// Names every submission must bind at module level.
    #[builder(default, with = |names: impl IntoIterator<Item = impl Into<String>>| {
        names.into_iter().map(Into::into).collect::<Vec<String>>()
    })]
    required_names: Vec<String>,
    /// Packages the submission imports, injected when running through `uv`.
    #[builder(default, with = |names: impl IntoIterator<Item = impl Into<String>>| {
        names.into_iter().map(Into::into).collect::<Vec<String>>()
    })]
    packages:       Vec<String>,
}

impl Exercise {
    /// Exercise name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Questions in report order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Names every submission must bind.
    pub fn required_names(&self) -> &[String] {
        &self.required_names
    }

    /// Packages needed to run submissions.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    /// Question identifiers in order.
    pub fn question_ids(&self) -> Vec<String> {
        self.questions.iter().map(|q| q.id().to_string()).collect()
    }

    /// Sum of every question's maximum.
    pub fn max_points(&self) -> f64 {
        self.questions.iter().map(Question::max_points).sum()
    }

    /// Checks that the exercise can be graded.
    pub fn validate(&self) -> Result<(), ExerciseError> {
        if self.questions.is_empty() {
            return Err(ExerciseError::NoQuestions(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if question.id.trim().is_empty() {
                return Err(ExerciseError::EmptyId(self.name.clone()));
            }
            if !seen.insert(question.id.as_str()) {
                return Err(ExerciseError::DuplicateQuestion(question.id.clone()));
            }
            if question.header.trim().is_empty() {
                return Err(ExerciseError::EmptyHeader(question.id.clone()));
            }
            if question.cases.is_empty() {
                return Err(ExerciseError::NoCases(question.id.clone()));
            }
            if let Some(case) = question
                .cases
                .iter()
                .find(|c| !c.points.is_finite() || c.points < 0.0)
            {
                return Err(ExerciseError::InvalidPoints {
                    question: question.id.clone(),
                    points:   case.points,
                });
            }
        }

        Ok(())
    }
}

/// The built-in exercises, one per binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExerciseKind {
    /// List/dict processing in plain Python.
    PythonList,
    /// The same processing with pandas DataFrames.
    Pandas,
}

impl ExerciseKind {
    /// Builds the exercise definition.
    pub fn exercise(self) -> Exercise {
        match self {
            ExerciseKind::PythonList => python_list::exercise(),
            ExerciseKind::Pandas => pandas::exercise(),
        }
    }

    /// Directory searched for submissions when none is given.
    pub fn default_src_dir(self) -> &'static str {
        match self {
            ExerciseKind::PythonList => PYTHON_LIST_SRC_DIR,
            ExerciseKind::Pandas => PANDAS_SRC_DIR,
        }
    }

    /// Report written when no output is given.
    pub fn default_output(self) -> &'static str {
        match self {
            ExerciseKind::PythonList => PYTHON_LIST_OUTPUT,
            ExerciseKind::Pandas => PANDAS_OUTPUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(points: f64) -> TestCase {
        TestCase::builder()
            .expected(Value::Int(1))
            .points(points)
            .build()
    }

    #[test]
    fn validation_catches_broken_definitions() {
        let empty = Exercise::builder().name("empty").build();
        assert_eq!(empty.validate(), Err(ExerciseError::NoQuestions("empty".into())));

        let no_cases = Exercise::builder()
            .name("x")
            .questions(vec![Question::builder().id("q1").header("Q1:").build()])
            .build();
        assert_eq!(no_cases.validate(), Err(ExerciseError::NoCases("q1".into())));

        let duplicate = Exercise::builder()
            .name("x")
            .questions(vec![
                Question::builder().id("q1").header("A:").cases(vec![case(1.0)]).build(),
                Question::builder().id("q1").header("B:").cases(vec![case(1.0)]).build(),
            ])
            .build();
        assert_eq!(duplicate.validate(), Err(ExerciseError::DuplicateQuestion("q1".into())));

        let negative = Exercise::builder()
            .name("x")
            .questions(vec![Question::builder().id("q1").header("A:").cases(vec![case(-1.0)]).build()])
            .build();
        assert!(matches!(negative.validate(), Err(ExerciseError::InvalidPoints { .. })));
    }

    #[test]
    fn builtin_exercises_are_valid() {
        for kind in [ExerciseKind::PythonList, ExerciseKind::Pandas] {
            let exercise = kind.exercise();
            exercise.validate().expect("valid builtin exercise");
            assert_eq!(
                exercise.question_ids(),
                ["joined", "grouped", "sorted_result", "top_user"]
            );
        }
        assert_eq!(ExerciseKind::PythonList.exercise().max_points(), 70.0);
        assert_eq!(ExerciseKind::Pandas.exercise().max_points(), 40.0);
    }
}
