#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Command-line surface shared by the `grade-python-list` and `grade-pandas`
//! binaries.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use tracing::info;

use crate::{
    config::{GradingConfig, resolve_interpreter, timeout_from_env},
    exercise::{Exercise, ExerciseKind, file},
    grade::grade_all,
    report::{Report, ReportWriter, format_points},
    submission::ScriptResolver,
};

/// Parsed command-line flags. Every flag is optional.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Submission directory.
    pub src:     Option<PathBuf>,
    /// Report destination.
    pub out:     Option<PathBuf>,
    /// Per-run timeout in seconds.
    pub timeout: Option<u64>,
    /// Roster of expected students.
    pub roster:  Option<PathBuf>,
    /// Exercise definition replacing the built-in one.
    pub cases:   Option<PathBuf>,
    /// Python interpreter.
    pub python:  Option<PathBuf>,
    /// Run through `uv` with the exercise's packages.
    pub uv:      bool,
    /// Add `filename` and `remarks` columns.
    pub remarks: bool,
    /// Omit the UTF-8 byte order mark.
    pub no_bom:  bool,
    /// Skip the summary table.
    pub quiet:   bool,
}

/// Builds the flag parser for one of the built-in exercises.
pub fn options(kind: ExerciseKind) -> OptionParser<Options> {
    let src = long("src")
        .help(format!("Directory of submissions (default: {})", kind.default_src_dir()).as_str())
        .argument::<PathBuf>("DIR")
        .optional();
    let out = long("out")
        .short('o')
        .help(format!("CSV report to write (default: {})", kind.default_output()).as_str())
        .argument::<PathBuf>("FILE")
        .optional();
    let timeout = long("timeout")
        .help("Seconds a submission may run (default: 8, or SCORECARD_TIMEOUT_SECS)")
        .argument::<u64>("SECS")
        .guard(|secs| *secs > 0, "timeout must be at least one second")
        .optional();
    let roster = long("roster")
        .help("File with one expected student ID per line")
        .argument::<PathBuf>("FILE")
        .optional();
    let cases = long("cases")
        .help("JSON exercise definition to grade against instead of the built-in one")
        .argument::<PathBuf>("FILE")
        .optional();
    let python = long("python")
        .help("Python interpreter (default: SCORECARD_PYTHON, then python3 on PATH)")
        .argument::<PathBuf>("PATH")
        .optional();
    let uv = long("uv")
        .help("Run submissions with `uv run --with <packages>`")
        .switch();
    let remarks = long("remarks")
        .help("Add filename and remarks columns to the report")
        .switch();
    let no_bom = long("no-bom")
        .help("Do not start the report with a UTF-8 byte order mark")
        .switch();
    let quiet = long("quiet")
        .short('q')
        .help("Do not print the summary table")
        .switch();

    construct!(Options {
        src,
        out,
        timeout,
        roster,
        cases,
        python,
        uv,
        remarks,
        no_bom,
        quiet
    })
    .to_options()
    .descr(format!("Grades `{}` submissions into a CSV report", kind.exercise().name()).as_str())
}

/// Loads the exercise to grade: the `--cases` file if given, else the
/// built-in definition.
pub fn load_exercise(kind: ExerciseKind, cases: Option<&std::path::Path>) -> Result<Exercise> {
    let exercise = match cases {
        Some(path) => file::load(path)?,
        None => kind.exercise(),
    };
    exercise
        .validate()
        .with_context(|| format!("Exercise `{}` cannot be graded", exercise.name()))?;
    Ok(exercise)
}

/// Combines flags, environment and defaults into a run configuration.
pub fn configure(kind: ExerciseKind, opts: &Options, exercise: &Exercise) -> Result<GradingConfig> {
    let interpreter = resolve_interpreter(opts.python.as_deref(), opts.uv, exercise.packages())?;
    info!("Running submissions with {interpreter:?}");

    Ok(GradingConfig::builder()
        .src_dir(
            opts.src
                .clone()
                .unwrap_or_else(|| kind.default_src_dir().into()),
        )
        .output(
            opts.out
                .clone()
                .unwrap_or_else(|| kind.default_output().into()),
        )
        .maybe_roster(opts.roster.clone())
        .timeout(
            opts.timeout
                .map(Duration::from_secs)
                .unwrap_or_else(timeout_from_env),
        )
        .interpreter(interpreter)
        .remarks(opts.remarks)
        .bom(!opts.no_bom)
        .build())
}

/// Grades every submission and writes the report.
pub async fn run(kind: ExerciseKind, opts: Options) -> Result<Report> {
    let exercise = load_exercise(kind, opts.cases.as_deref())?;
    let config = configure(kind, &opts, &exercise)?;

    let resolver = ScriptResolver::new(&config, &exercise)?;
    let report = grade_all(&resolver, &exercise).await?;

    ReportWriter::builder()
        .remarks(config.remarks())
        .bom(config.bom())
        .build()
        .write(&report, config.output())?;
    info!("Report written to {}", config.output().display());

    if !opts.quiet {
        eprintln!("{}", report.summary_table(exercise.name(), exercise.max_points()));
    }
    eprintln!(
        "{}",
        format!(
            "Graded {} student(s), mean {:.2}/{} -> {}",
            report.len(),
            report.mean_total(),
            format_points(exercise.max_points()),
            config.output().display()
        )
        .bright_green()
    );

    Ok(report)
}
