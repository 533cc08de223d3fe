#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    ffi::{OsStr, OsString},
    path::Path,
    process::Stdio,
    time::Duration,
};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
    process::{Child, ChildStderr, ChildStdout, Command},
    task::JoinHandle,
    time::timeout,
};

/// Errors raised while spawning or collecting a subprocess.
#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    /// The program could not be started at all.
    #[error("failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),
    /// Reading a pipe or waiting on the child failed.
    #[error("failed to collect process output: {0}")]
    Io(#[source] std::io::Error),
    /// A pipe that was requested was not attached to the child.
    #[error("missing {0} pipe")]
    MissingPipe(&'static str),
    /// The process did not finish before the deadline and was killed.
    #[error("process timed out after {0:?}")]
    TimedOut(Duration),
}

/// Drop guard that terminates a spawned child process if callers forget to
/// await it, or if the wait is abandoned by a timeout.
struct ChildDropGuard(Option<Child>);

impl ChildDropGuard {
    /// Wraps the provided child process with the drop guard.
    fn new(child: Child) -> Self {
        Self(Some(child))
    }

    /// Returns a mutable reference to the underlying child process.
    fn child_mut(&mut self) -> Result<&mut Child, ProcessError> {
        self.0.as_mut().ok_or(ProcessError::MissingPipe("child"))
    }

    /// Prevents the guard from killing the process on drop.
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl Drop for ChildDropGuard {
    fn drop(&mut self) {
        if let Some(child) = self.0.as_mut() {
            let _ = child.start_kill();
        }
    }
}

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct Collected {
    /// Exit status returned by the process.
    pub status: std::process::ExitStatus,
    /// Contents written to stdout.
    pub stdout: Vec<u8>,
    /// Contents written to stderr.
    pub stderr: Vec<u8>,
}

/// Describes how stdin should be wired for the spawned process.
#[derive(Debug)]
pub enum StdinSource {
    /// Attach nothing to stdin.
    Null,
    /// Write the provided bytes, then close stdin.
    Bytes(Vec<u8>),
}

impl From<Option<&str>> for StdinSource {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(text) => StdinSource::Bytes(text.as_bytes().to_vec()),
            None => StdinSource::Null,
        }
    }
}

/// Reads a child pipe to the end on a background task.
fn drain<R>(pipe: R) -> JoinHandle<Result<Vec<u8>, ProcessError>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(ProcessError::Io)?;
        Ok::<_, ProcessError>(buf)
    })
}

/// Awaits a drain task, folding join errors into [`ProcessError::Io`].
async fn join_drain(
    task: JoinHandle<Result<Vec<u8>, ProcessError>>,
) -> Result<Vec<u8>, ProcessError> {
    task.await
        .map_err(|e| ProcessError::Io(std::io::Error::other(e)))?
}

/// Spawns a command, optionally feeds stdin, and collects stdout/stderr.
///
/// When `deadline` elapses the child is killed and
/// [`ProcessError::TimedOut`] is returned.
pub async fn run_collect(
    program: impl AsRef<OsStr>,
    args: &[OsString],
    stdin: StdinSource,
    cwd: Option<&Path>,
    env: &[(OsString, OsString)],
    deadline: Option<Duration>,
) -> Result<Collected, ProcessError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match &stdin {
        StdinSource::Null => {
            cmd.stdin(Stdio::null());
        }
        StdinSource::Bytes(_) => {
            cmd.stdin(Stdio::piped());
        }
    }

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }

    let mut guard = ChildDropGuard::new(cmd.spawn().map_err(ProcessError::Spawn)?);

    if let StdinSource::Bytes(bytes) = stdin
        && let Some(mut handle) = guard.child_mut()?.stdin.take()
    {
        tokio::spawn(async move {
            if !bytes.is_empty() {
                let _ = handle.write_all(&bytes).await;
            }
            let _ = handle.shutdown().await;
        });
    }

    let stdout: ChildStdout = guard
        .child_mut()?
        .stdout
        .take()
        .ok_or(ProcessError::MissingPipe("stdout"))?;
    let stderr: ChildStderr = guard
        .child_mut()?
        .stderr
        .take()
        .ok_or(ProcessError::MissingPipe("stderr"))?;

    let out_task = drain(stdout);
    let err_task = drain(stderr);

    let wait_future = async move {
        let mut guard = guard;
        let status = guard
            .child_mut()?
            .wait()
            .await
            .map_err(ProcessError::Io)?;
        let stdout = join_drain(out_task).await?;
        let stderr = join_drain(err_task).await?;
        guard.disarm();
        Ok::<_, ProcessError>(Collected {
            status,
            stdout,
            stderr,
        })
    };

    match deadline {
        Some(limit) => timeout(limit, wait_future)
            .await
            .map_err(|_| ProcessError::TimedOut(limit))?,
        None => wait_future.await,
    }
}
