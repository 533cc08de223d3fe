#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Grading: running each submission against every test case and folding the
//! outcomes into score rows and a report.

use anyhow::Result;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    exercise::{Exercise, Question, TestCase, answer_after_header},
    python::{Value, parse_literal},
    report::{Report, ReportError, ScoreRow},
    submission::{StudentEntry, Submission, SubmissionLoadError, SubmissionResolver},
};

/// Why a test case did not pass, given a successful run.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CaseFailure {
    /// The header, or anything after it, is missing.
    #[error("Missing or unparsable output for: {question}")]
    MissingOutput {
        /// Question identifier.
        question: String,
    },
    /// The answer line is not a Python literal.
    #[error("Missing or unparsable output for: {question} (printed `{line}`)")]
    Unparsable {
        /// Question identifier.
        question: String,
        /// The answer line as printed.
        line:     String,
    },
    /// The answer differs from the expected value.
    #[error("{question}: expected {expected}, got {actual}")]
    Mismatch {
        /// Question identifier.
        question: String,
        /// Expected value.
        expected: Value,
        /// Printed value.
        actual:   Value,
    },
    /// The answer has a type that can never equal the expected one.
    #[error("{question}: expected a {expected_type}, got a {actual_type} ({actual})")]
    Incomparable {
        /// Question identifier.
        question:      String,
        /// Python type of the expected value.
        expected_type: &'static str,
        /// Python type of the printed value.
        actual_type:   &'static str,
        /// Printed value.
        actual:        Value,
    },
}

/// Longest answer line quoted in a remark.
const QUOTED_LINE_CHARS: usize = 80;

/// Compares the literal printed after the question's header with the
/// expected value.
fn check_literal(stdout: &str, question: &Question, case: &TestCase) -> Result<(), CaseFailure> {
    let line = answer_after_header(stdout, question.header()).ok_or_else(|| {
        CaseFailure::MissingOutput {
            question: question.id().to_string(),
        }
    })?;

    let actual = parse_literal(line).map_err(|_| CaseFailure::Unparsable {
        question: question.id().to_string(),
        line:     line.chars().take(QUOTED_LINE_CHARS).collect(),
    })?;

    let expected = case.expected();
    if actual.py_eq(expected, case.tolerance()) {
        return Ok(());
    }

    if expected.comparable_with(&actual) {
        Err(CaseFailure::Mismatch {
            question: question.id().to_string(),
            expected: expected.clone(),
            actual,
        })
    } else {
        Err(CaseFailure::Incomparable {
            question:      question.id().to_string(),
            expected_type: expected.type_name(),
            actual_type:   actual.type_name(),
            actual,
        })
    }
}

/// Checks one test case against a run's stdout: the printed literal must
/// match, or one of the case's fallbacks must accept the text.
pub fn check_case(stdout: &str, question: &Question, case: &TestCase) -> Result<(), CaseFailure> {
    let literal = check_literal(stdout, question, case);
    if literal.is_err()
        && case
            .fallbacks()
            .iter()
            .any(|fallback| fallback.accepts(stdout, case.tolerance()))
    {
        return Ok(());
    }
    literal
}

/// Grades one submission. Every test case is run and judged independently; a
/// failure only costs that case's points.
pub async fn grade<S: Submission>(submission: &mut S, exercise: &Exercise) -> ScoreRow {
    let student = submission.student_id().to_string();
    let mut points = Vec::with_capacity(exercise.questions().len());
    let mut remarks = Vec::new();

    for question in exercise.questions() {
        let mut earned = 0.0;
        for (idx, case) in question.cases().iter().enumerate() {
            let outcome = match submission.execute(case.stdin()).await {
                Ok(transcript) => {
                    check_case(&transcript.stdout, question, case).map_err(|e| e.to_string())
                }
                Err(e) => Err(e.to_string()),
            };

            match outcome {
                Ok(()) => earned += case.points(),
                Err(remark) => {
                    debug!("{student}: {} case {} failed: {remark}", question.id(), idx + 1);
                    remarks.push(remark);
                }
            }
        }
        points.push(earned);
    }

    let remarks = remarks.into_iter().unique().collect();
    ScoreRow::new(
        student,
        submission.file_name().map(str::to_string),
        points,
        remarks,
    )
}

/// The zero row recorded for a student whose submission could not be loaded.
pub fn load_failure_row(
    entry: &StudentEntry,
    exercise: &Exercise,
    error: &SubmissionLoadError,
) -> ScoreRow {
    ScoreRow::zero(
        entry.student_id(),
        entry.file_name(),
        exercise.questions().len(),
        error.to_string(),
    )
}

/// Discovers, loads and grades every student, in discovery order.
///
/// Submission problems become zero rows; only discovery failures and
/// duplicate students abort the run, before any submission is loaded.
pub async fn grade_all<R: SubmissionResolver>(resolver: &R, exercise: &Exercise) -> Result<Report> {
    info!("Loading submissions for `{}`", exercise.name());
    let entries = resolver.discover()?;
    if let Some(id) = entries.iter().map(StudentEntry::student_id).duplicates().next() {
        return Err(ReportError::DuplicateStudent(id.to_string()).into());
    }
    info!("Found {} student(s)", entries.len());

    let mut report = Report::new(exercise.question_ids());
    for entry in &entries {
        let row = match resolver.resolve(entry) {
            Ok(mut submission) => {
                info!("Grading {}", entry.student_id());
                grade(&mut submission, exercise).await
            }
            Err(e) => {
                warn!("Skipping {}: {e}", entry.student_id());
                load_failure_row(entry, exercise, &e)
            }
        };
        report.push(row)?;
    }

    info!("Aggregated {} row(s)", report.len());
    Ok(report)
}
