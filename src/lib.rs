//! # scorecard
//!
//! An autograder for the Python data-processing exercises: runs every
//! student's script, reads the answers it prints, scores them against the
//! exercise's test cases and writes a CSV report.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Command-line options and the end-to-end run.
pub mod cli;
/// Run configuration.
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Exercises, questions and test cases.
pub mod exercise;
/// Judging submissions against test cases.
pub mod grade;
/// Spawning subprocesses with timeouts.
pub mod process;
/// Python literals, sources and interpreters.
pub mod python;
/// Score rows, reports and CSV output.
pub mod report;
/// Discovering, loading and running submissions.
pub mod submission;

pub use exercise::{Exercise, ExerciseKind};
pub use grade::{grade, grade_all};
pub use report::{Report, ReportWriter, ScoreRow};
