#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Finding, checking and running student submissions.
//!
//! A [`SubmissionResolver`] lists the students of a run and turns each one
//! into a [`Submission`], or explains why it cannot. The grader only ever
//! talks to these two traits, so it can be driven by scripted stand-ins in
//! tests.

use std::{
    collections::HashMap,
    ffi::OsString,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result, bail};
use glob::{Pattern, glob};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::{
    config::GradingConfig,
    constants::STDERR_EXCERPT_CHARS,
    exercise::Exercise,
    process::{self, ProcessError},
    python::{Interpreter, Parser},
};

/// A student the run must produce a row for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentEntry {
    /// Student identifier.
    student_id: String,
    /// Submission file, if one was found.
    path:       Option<PathBuf>,
}

impl StudentEntry {
    /// Creates a new entry.
    pub fn new(student_id: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            student_id: student_id.into(),
            path,
        }
    }

    /// Student identifier.
    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Submission file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// File name of the submission, if any.
    pub fn file_name(&self) -> Option<String> {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// Output of one successful run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transcript {
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl Transcript {
    /// A transcript with only stdout.
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Why a submission could not be loaded.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionLoadError {
    /// The student has no submission file.
    #[error("No submission found")]
    Missing,
    /// The file exists but could not be read.
    #[error("Could not read submission: {0}")]
    Unreadable(String),
    /// The file is not valid Python.
    #[error("Syntax error near line {line}")]
    Syntax {
        /// 1-based line of the first error.
        line: usize,
    },
    /// Names the exercise asks for are never bound.
    #[error("Missing definition(s): {}", .names.join(", "))]
    MissingDefinition {
        /// The unbound names, sorted.
        names: Vec<String>,
    },
}

/// Why running a submission did not produce a transcript.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// The interpreter could not be started or its output collected.
    #[error("Could not run script: {0}")]
    Spawn(String),
    /// The script exited unsuccessfully.
    #[error("Script failed (exit {}). Stderr: {stderr}", exit_label(.code))]
    Exited {
        /// Exit code, `None` when killed by a signal.
        code:   Option<i32>,
        /// Leading part of stderr.
        stderr: String,
    },
    /// The script ran past the timeout and was killed.
    #[error("Timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

/// Renders an exit code, or `signal` when there is none.
fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

/// Keeps the first [`STDERR_EXCERPT_CHARS`] characters of trimmed stderr.
pub fn stderr_excerpt(stderr: &str) -> String {
    stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect()
}

/// Executable student code.
pub trait Submission {
    /// Student identifier.
    fn student_id(&self) -> &str;

    /// File the code came from, if any.
    fn file_name(&self) -> Option<&str>;

    /// Runs the code with `stdin` and returns what it printed.
    fn execute(
        &mut self,
        stdin: Option<&str>,
    ) -> impl Future<Output = Result<Transcript, ExecutionError>>;
}

/// Source of the students in a run.
pub trait SubmissionResolver {
    /// Submission type produced.
    type Submission: Submission;

    /// Lists every student, in report order.
    fn discover(&self) -> Result<Vec<StudentEntry>>;

    /// Loads one student's submission.
    fn resolve(&self, entry: &StudentEntry) -> Result<Self::Submission, SubmissionLoadError>;
}

/// Student identifier encoded in a submission file name: everything before
/// the first `_`, or the whole stem if there is no `_` (or nothing before
/// it).
pub fn student_id_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    let id = match stem.split_once('_') {
        Some((id, _)) if !id.is_empty() => id,
        _ => stem.as_ref(),
    };
    Some(id.to_string())
}

/// Parses a roster: one student ID per line, blank lines and `#` comments
/// ignored.
pub fn parse_roster(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a roster file.
pub fn read_roster(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read roster {}", path.display()))?;
    Ok(parse_roster(&text))
}

/// Orders students: roster students first in roster order (each with all
/// their files, or none), then students found only on disk, by path.
pub fn order_entries(roster: &[String], files: Vec<(String, PathBuf)>) -> Vec<StudentEntry> {
    let mut by_id: HashMap<&str, Vec<&PathBuf>> = HashMap::new();
    for (id, path) in &files {
        by_id.entry(id.as_str()).or_default().push(path);
    }

    let mut entries = Vec::with_capacity(roster.len().max(files.len()));
    for id in roster {
        match by_id.remove(id.as_str()) {
            Some(paths) => entries.extend(
                paths
                    .into_iter()
                    .map(|p| StudentEntry::new(id.clone(), Some(p.clone()))),
            ),
            None => entries.push(StudentEntry::new(id.clone(), None)),
        }
    }

    entries.extend(
        files
            .iter()
            .filter(|(id, _)| by_id.contains_key(id.as_str()))
            .map(|(id, path)| StudentEntry::new(id.clone(), Some(path.clone()))),
    );
    entries
}

/// Finds Python submissions on disk and runs them with an interpreter.
#[derive(Debug, Clone)]
pub struct ScriptResolver {
    /// Directory searched for `*.py` files.
    src_dir:        PathBuf,
    /// Exercise name, the expected file-name suffix.
    exercise_name:  String,
    /// Names each submission must bind.
    required_names: Vec<String>,
    /// Expected students, possibly empty.
    roster:         Vec<String>,
    /// How scripts are launched.
    interpreter:    Interpreter,
    /// Per-run limit.
    timeout:        Duration,
}

impl ScriptResolver {
    /// Prepares a resolver for `exercise`, reading the roster if configured.
    pub fn new(config: &GradingConfig, exercise: &Exercise) -> Result<Self> {
        let roster = match config.roster() {
            Some(path) => read_roster(path)?,
            None => Vec::new(),
        };

        Ok(Self {
            src_dir: config.src_dir().to_path_buf(),
            exercise_name: exercise.name().to_string(),
            required_names: exercise.required_names().to_vec(),
            roster,
            interpreter: config.interpreter().clone(),
            timeout: config.timeout(),
        })
    }

    /// Lists `*.py` files directly inside the source directory, sorted.
    fn python_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.src_dir.to_string_lossy();
        let pattern = format!("{}/*.py", Pattern::escape(&dir));
        let mut files = glob(&pattern)
            .with_context(|| format!("Invalid search pattern {pattern}"))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect::<Vec<_>>();
        files.sort();
        Ok(files)
    }
}

impl SubmissionResolver for ScriptResolver {
    type Submission = ScriptSubmission;

    fn discover(&self) -> Result<Vec<StudentEntry>> {
        if !self.src_dir.is_dir() {
            bail!("Submission directory {} does not exist", self.src_dir.display());
        }

        let suffix = format!("_{}", self.exercise_name);
        let mut files = Vec::new();
        for path in self.python_files()? {
            let Some(id) = student_id_from_path(&path) else {
                continue;
            };
            let conventional = path
                .file_stem()
                .is_some_and(|stem| stem.to_string_lossy() == format!("{id}{suffix}"));
            if !conventional {
                warn!(
                    "{} does not follow the {{id}}{suffix}.py convention; grading it as `{id}`",
                    path.display()
                );
            }
            files.push((id, path));
        }

        Ok(order_entries(&self.roster, files))
    }

    fn resolve(&self, entry: &StudentEntry) -> Result<ScriptSubmission, SubmissionLoadError> {
        let path = entry.path().ok_or(SubmissionLoadError::Missing)?;
        // undecodable bytes are replaced; the interpreter applies any coding line
        let bytes =
            std::fs::read(path).map_err(|e| SubmissionLoadError::Unreadable(e.to_string()))?;
        let source = String::from_utf8_lossy(&bytes).into_owned();
        let script = path
            .canonicalize()
            .map_err(|e| SubmissionLoadError::Unreadable(e.to_string()))?;

        let parser =
            Parser::new(source).map_err(|e| SubmissionLoadError::Unreadable(format!("{e:#}")))?;
        if let Some(line) = parser.first_error_line() {
            return Err(SubmissionLoadError::Syntax { line });
        }

        let bound = parser
            .bound_names()
            .map_err(|e| SubmissionLoadError::Unreadable(format!("{e:#}")))?;
        let missing = self
            .required_names
            .iter()
            .filter(|name| !bound.contains(name.as_str()))
            .cloned()
            .sorted()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(SubmissionLoadError::MissingDefinition { names: missing });
        }

        Ok(ScriptSubmission {
            student_id: entry.student_id().to_string(),
            file_name: entry.file_name().unwrap_or_default(),
            script,
            interpreter: self.interpreter.clone(),
            timeout: self.timeout,
            runs: HashMap::new(),
        })
    }
}

/// A Python script, run at most once per distinct stdin.
#[derive(Debug)]
pub struct ScriptSubmission {
    /// Student identifier.
    student_id:  String,
    /// File name as found on disk.
    file_name:   String,
    /// Absolute path of the script.
    script:      PathBuf,
    /// How the script is launched.
    interpreter: Interpreter,
    /// Per-run limit.
    timeout:     Duration,
    /// Outcomes by stdin.
    runs:        HashMap<Option<String>, Result<Transcript, ExecutionError>>,
}

impl ScriptSubmission {
    /// Runs the script once, from its own directory.
    async fn run(&self, stdin: Option<&str>) -> Result<Transcript, ExecutionError> {
        let (program, args) = self.interpreter.command(&self.script);
        let env: [(OsString, OsString); 1] = [("PYTHONIOENCODING".into(), "utf-8".into())];

        let collected = process::run_collect(
            &program,
            &args,
            stdin.into(),
            self.script.parent(),
            &env,
            Some(self.timeout),
        )
        .await
        .map_err(|e| match e {
            ProcessError::TimedOut(limit) => ExecutionError::TimedOut(limit),
            other => ExecutionError::Spawn(other.to_string()),
        })?;

        let stdout = String::from_utf8_lossy(&collected.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&collected.stderr).into_owned();
        if collected.status.success() {
            Ok(Transcript { stdout, stderr })
        } else {
            Err(ExecutionError::Exited {
                code:   collected.status.code(),
                stderr: stderr_excerpt(&stderr),
            })
        }
    }
}

impl Submission for ScriptSubmission {
    fn student_id(&self) -> &str {
        &self.student_id
    }

    fn file_name(&self) -> Option<&str> {
        Some(&self.file_name)
    }

    async fn execute(&mut self, stdin: Option<&str>) -> Result<Transcript, ExecutionError> {
        let key = stdin.map(str::to_string);
        if let Some(outcome) = self.runs.get(&key) {
            debug!("Reusing run of {} for {}", self.file_name, self.student_id);
            return outcome.clone();
        }

        let outcome = self.run(stdin).await;
        self.runs.insert(key, outcome.clone());
        outcome
    }
}
