#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Exercise definitions loaded from JSON.
//!
//! Expected values are written as Python literal strings, exactly as a
//! submission would print them:
//!
//! ```json
//! {
//!   "name": "python_list",
//!   "required_names": ["joined"],
//!   "questions": [
//!     {
//!       "id": "joined",
//!       "header": "✅ Joined Result:",
//!       "cases": [{ "expected": "[{'name': 'Alice', 'total': 100}]", "points": 15 }]
//!     }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Check, Exercise, Fallback, Question, Scope, TableRow, TestCase};
use crate::python::{Tolerance, parse_literal};

/// Top-level exercise document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseFile {
    /// Exercise name, also the file-name suffix.
    pub name:           String,
    /// Names every submission must bind.
    #[serde(default)]
    pub required_names: Vec<String>,
    /// Packages injected when running through `uv`.
    #[serde(default)]
    pub packages:       Vec<String>,
    /// Questions in report order.
    pub questions:      Vec<QuestionFile>,
}

/// A question as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFile {
    /// Identifier and report column.
    pub id:     String,
    /// Line printed right before the answer.
    pub header: String,
    /// Test cases.
    pub cases:  Vec<CaseFile>,
}

/// A test case as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseFile {
    /// Data for stdin.
    #[serde(default)]
    pub stdin:     Option<String>,
    /// Expected value as a Python literal.
    pub expected:  String,
    /// Points for passing.
    pub points:    f64,
    /// Float tolerance, exact when omitted.
    #[serde(default)]
    pub tolerance: Tolerance,
    /// Text fallbacks.
    #[serde(default)]
    pub fallbacks: Vec<FallbackFile>,
}

/// A fallback as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackFile {
    /// Only look at the text after this marker; all of stdout when omitted.
    #[serde(default)]
    pub after:  Option<String>,
    /// Checks that must all hold.
    pub checks: Vec<CheckFile>,
}

/// A table row expectation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowFile {
    /// Label token.
    pub label:  String,
    /// Numbers following the label.
    #[serde(default)]
    pub values: Vec<f64>,
}

/// A check as written in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckFile {
    /// `{"row": {"label": "Alice", "values": [2, 250]}}`
    Row(RowFile),
    /// `{"ordered_rows": [...]}`
    OrderedRows(Vec<RowFile>),
    /// `{"pattern": "(?i)Name:\\s*Alice"}`
    Pattern(String),
}

impl From<RowFile> for TableRow {
    fn from(row: RowFile) -> Self {
        TableRow::new(row.label, row.values)
    }
}

impl CheckFile {
    /// Compiles the check.
    fn into_check(self) -> Result<Check> {
        Ok(match self {
            CheckFile::Row(row) => Check::Row(row.into()),
            CheckFile::OrderedRows(rows) => {
                Check::OrderedRows(rows.into_iter().map(TableRow::from).collect())
            }
            CheckFile::Pattern(pattern) => Check::Pattern(
                Regex::new(&pattern).with_context(|| format!("Invalid pattern `{pattern}`"))?,
            ),
        })
    }
}

impl FallbackFile {
    /// Compiles the fallback.
    fn into_fallback(self) -> Result<Fallback> {
        let scope = self.after.map_or(Scope::Whole, Scope::After);
        let checks = self
            .checks
            .into_iter()
            .map(CheckFile::into_check)
            .collect::<Result<Vec<_>>>()?;
        Ok(Fallback::new(scope, checks))
    }
}

impl CaseFile {
    /// Parses the expected literal and compiles the fallbacks.
    fn into_case(self) -> Result<TestCase> {
        let expected = parse_literal(&self.expected)
            .with_context(|| format!("Expected value `{}` is not a Python literal", self.expected))?;
        let fallbacks = self
            .fallbacks
            .into_iter()
            .map(FallbackFile::into_fallback)
            .collect::<Result<Vec<_>>>()?;

        Ok(TestCase::builder()
            .maybe_stdin(self.stdin)
            .expected(expected)
            .points(self.points)
            .tolerance(self.tolerance)
            .fallbacks(fallbacks)
            .build())
    }
}

impl ExerciseFile {
    /// Reads and parses an exercise document.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read exercise file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Could not parse exercise file {}", path.display()))
    }

    /// Builds and validates the exercise.
    pub fn into_exercise(self) -> Result<Exercise> {
        let mut questions = Vec::with_capacity(self.questions.len());
        for question in self.questions {
            let id = question.id;
            let cases = question
                .cases
                .into_iter()
                .enumerate()
                .map(|(idx, case)| {
                    case.into_case()
                        .with_context(|| format!("In case {} of question `{id}`", idx + 1))
                })
                .collect::<Result<Vec<_>>>()?;
            questions.push(
                Question::builder()
                    .id(id)
                    .header(question.header)
                    .cases(cases)
                    .build(),
            );
        }

        let exercise = Exercise::builder()
            .name(self.name)
            .questions(questions)
            .required_names(self.required_names)
            .packages(self.packages)
            .build();
        exercise.validate()?;
        Ok(exercise)
    }
}

/// Loads an exercise from a JSON document on disk.
pub fn load(path: &Path) -> Result<Exercise> {
    ExerciseFile::read(path)?
        .into_exercise()
        .with_context(|| format!("Invalid exercise file {}", path.display()))
}
