#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Run configuration: where submissions live, where the report goes and how
//! scripts are executed.
//!
//! Values come from the built-in defaults of the exercise, then the
//! environment (`SCORECARD_PYTHON`, `SCORECARD_TIMEOUT_SECS`, possibly loaded
//! from a `.env` file), then command-line flags.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use bon::Builder;

use crate::{
    constants::{DEFAULT_TIMEOUT, PYTHON_ENV, TIMEOUT_ENV},
    python::Interpreter,
};

/// Everything a grading run needs besides the exercise itself.
#[derive(Debug, Clone, Builder)]
#[builder(on(PathBuf, into))]
pub struct GradingConfig {
    /// Directory holding `{id}_{exercise}.py` files.
    src_dir:     PathBuf,
    /// Destination CSV.
    output:      PathBuf,
    /// Optional list of expected student IDs.
    roster:      Option<PathBuf>,
    /// Limit for a single submission run.
    #[builder(default = DEFAULT_TIMEOUT)]
    timeout:     Duration,
    /// How scripts are launched.
    interpreter: Interpreter,
    /// Add `filename` and `remarks` columns to the report.
    #[builder(default)]
    remarks:     bool,
    /// Start the report with a UTF-8 byte order mark.
    #[builder(default = true)]
    bom:         bool,
}

impl GradingConfig {
    /// Submission directory.
    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// Report path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Roster path, if any.
    pub fn roster(&self) -> Option<&Path> {
        self.roster.as_deref()
    }

    /// Per-run timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Interpreter used for submissions.
    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Whether the report carries `filename` and `remarks` columns.
    pub fn remarks(&self) -> bool {
        self.remarks
    }

    /// Whether the report starts with a byte order mark.
    pub fn bom(&self) -> bool {
        self.bom
    }
}

/// Reads a timeout in whole seconds from `env`, falling back to `default`
/// when unset, unparsable or zero.
pub fn read_timeout(env: &str, default: Duration) -> Duration {
    std::env::var(env)
        .ok()
        .and_then(|value| parse_timeout(&value))
        .unwrap_or(default)
}

/// Parses a positive number of whole seconds, ignoring surrounding
/// whitespace.
pub fn parse_timeout(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Timeout from `SCORECARD_TIMEOUT_SECS`, or the default.
pub fn timeout_from_env() -> Duration {
    read_timeout(TIMEOUT_ENV, DEFAULT_TIMEOUT)
}

/// Picks the interpreter: `uv` when requested, else an explicit Python, else
/// `SCORECARD_PYTHON`, else whatever `python3`/`python` is on `PATH`.
pub fn resolve_interpreter(
    python: Option<&Path>,
    use_uv: bool,
    packages: &[String],
) -> Result<Interpreter> {
    if use_uv {
        return Interpreter::uv(packages);
    }
    if let Some(python) = python {
        return Interpreter::python(python);
    }
    match std::env::var_os(PYTHON_ENV).filter(|v| !v.is_empty()) {
        Some(python) => Interpreter::python(PathBuf::from(python))
            .with_context(|| format!("{PYTHON_ENV} does not point to a usable interpreter")),
        None => Interpreter::discover(),
    }
}
