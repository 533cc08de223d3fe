#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Python toolchain discovery and command construction.
//!
//! Submissions run either directly under a Python interpreter, or through
//! `uv run --with <pkg> -- python <script>` when the exercise needs packages
//! (pandas) that should not have to be installed by hand.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use which::which;

/// How submissions are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpreter {
    /// Run scripts with this Python executable.
    Python(PathBuf),
    /// Run scripts through `uv`, injecting the listed packages.
    Uv {
        /// Path to the `uv` binary.
        uv:       PathBuf,
        /// Packages passed as `--with` arguments.
        packages: Vec<String>,
    },
}

/// Finds and returns the path to the `uv` binary.
pub fn uv_path() -> Result<PathBuf> {
    which("uv").context(
        "Could not find uv. Please install it with: curl -LsSf https://astral.sh/uv/install.sh | sh",
    )
}

/// Finds and returns the path to a Python 3 interpreter (`python3`, then
/// `python`).
pub fn python_path() -> Result<PathBuf> {
    which("python3")
        .or_else(|_| which("python"))
        .map_err(|_| anyhow!("Could not find a Python interpreter on path (python3 or python)"))
}

impl Interpreter {
    /// Uses the provided Python executable, resolving bare names on `PATH`.
    /// Explicit paths are made absolute since scripts run from their own
    /// directory.
    pub fn python(program: impl AsRef<Path>) -> Result<Self> {
        let program = program.as_ref();
        let resolved = if program.components().count() > 1 {
            std::path::absolute(program)
                .with_context(|| format!("Invalid interpreter path {}", program.display()))?
        } else {
            which(program)
                .with_context(|| format!("Cannot find `{}` on path", program.display()))?
        };
        Ok(Interpreter::Python(resolved))
    }

    /// Locates a Python interpreter on `PATH`.
    pub fn discover() -> Result<Self> {
        Ok(Interpreter::Python(python_path()?))
    }

    /// Locates `uv` and prepares it to inject `packages`.
    pub fn uv(packages: &[String]) -> Result<Self> {
        Ok(Interpreter::Uv {
            uv:       uv_path()?,
            packages: packages.to_vec(),
        })
    }

    /// Returns the command and arguments that run `script`.
    pub fn command(&self, script: &Path) -> (OsString, Vec<OsString>) {
        match self {
            Interpreter::Python(python) => (
                python.clone().into_os_string(),
                vec![script.as_os_str().to_os_string()],
            ),
            Interpreter::Uv { uv, packages } => {
                let mut args: Vec<OsString> = vec!["run".into()];
                for package in packages {
                    args.push("--with".into());
                    args.push(package.into());
                }
                args.push("--".into());
                args.push("python".into());
                args.push(script.as_os_str().to_os_string());
                (uv.clone().into_os_string(), args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn python_command_passes_the_script() {
        let interpreter = Interpreter::Python(PathBuf::from("/usr/bin/python3"));
        let (program, args) = interpreter.command(Path::new("src/a_python_list.py"));
        assert_eq!(program, OsString::from("/usr/bin/python3"));
        assert_eq!(args, vec![OsString::from("src/a_python_list.py")]);
    }

    #[test]
    fn uv_command_injects_packages() {
        let interpreter = Interpreter::Uv {
            uv:       PathBuf::from("/opt/uv"),
            packages: vec!["pandas".to_string()],
        };
        let (program, args) = interpreter.command(Path::new("s_pandas.py"));
        assert_eq!(program, OsString::from("/opt/uv"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, ["run", "--with", "pandas", "--", "python", "s_pandas.py"]);
    }

    #[test]
    fn explicit_paths_are_not_searched() {
        let interpreter = Interpreter::python("/somewhere/python3").unwrap();
        assert_eq!(interpreter, Interpreter::Python(PathBuf::from("/somewhere/python3")));
    }
}
