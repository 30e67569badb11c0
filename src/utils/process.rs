//! External process execution.
//!
//! [`ToolCommand`] is a fluent builder for running the build toolchain and the
//! package manager. Both output pipes are drained concurrently while the child
//! runs, so a child that fills its stderr buffer while stdout is also pending
//! cannot deadlock us. Lines are forwarded to the console as they arrive (or to
//! the debug log when forwarding is off) and collected for error reporting; the
//! exit code stays authoritative and is never inferred from the text.
//!
//! The liveness helpers ([`is_process_alive`], [`wait_for_exit`]) are what the
//! handoff successor uses to wait until the original process is gone.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::WrapkitError;

/// Builder for an external command whose output is forwarded and captured.
///
/// # Examples
///
/// ```rust,no_run
/// use wrapkit_cli::utils::process::ToolCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let output = ToolCommand::new("dotnet")
///     .args(["build", "-c", "Release"])
///     .current_dir("/path/to/project")
///     .with_context("build")
///     .execute()
///     .await?;
/// assert!(output.success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    forward_output: bool,
    timeout_duration: Option<Duration>,
    context: Option<String>,
}

/// Captured result of a [`ToolCommand`].
#[derive(Debug, Clone)]
pub struct ToolCommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolCommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code with signal termination mapped to `-1`.
    #[must_use]
    pub fn code_or_signal(&self) -> i32 {
        self.code.unwrap_or(-1)
    }
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            forward_output: true,
            timeout_duration: None,
            context: None,
        }
    }

    /// Build from an argv-style list, first element is the program.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, rest) = argv.split_first().ok_or_else(|| WrapkitError::ConfigError {
            message: "command must not be empty".to_string(),
        })?;
        Ok(Self::new(program.clone()).args(rest.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Keep child output out of the console; it still goes to the debug log.
    pub const fn quiet(mut self) -> Self {
        self.forward_output = false;
        self
    }

    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The command line as a single display string.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command to completion.
    ///
    /// Fails only when the process cannot be started, its pipes cannot be read,
    /// or the timeout elapses. A non-zero exit is reported through
    /// [`ToolCommandOutput::code`].
    pub async fn execute(self) -> Result<ToolCommandOutput> {
        let start = Instant::now();
        let label = self.context.clone().unwrap_or_else(|| self.program.clone());
        debug!(target: "toolchain", "({}) Executing command: {}", label, self.display());

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| WrapkitError::ProcessSpawnFailed {
            program: self.program.clone(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let forward = self.forward_output;

        let run = async {
            let (out, err) = tokio::join!(
                drain_stream(stdout, forward, false, &label),
                drain_stream(stderr, forward, true, &label)
            );
            let status = child.wait().await;
            (out, err, status)
        };

        let (out, err, status) = match self.timeout_duration {
            Some(duration) => match timeout(duration, run).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        target: "toolchain",
                        "Command timed out after {} seconds: {}",
                        duration.as_secs(),
                        self.display()
                    );
                    return Err(WrapkitError::Other {
                        message: format!(
                            "Command timed out after {} seconds: {}",
                            duration.as_secs(),
                            self.display()
                        ),
                    }
                    .into());
                }
            },
            None => run.await,
        };

        let stdout = out.with_context(|| format!("Failed to read stdout of {}", self.program))?;
        let stderr = err.with_context(|| format!("Failed to read stderr of {}", self.program))?;
        let status = status.with_context(|| format!("Failed to wait for {}", self.program))?;

        let elapsed = start.elapsed();
        debug!(
            target: "toolchain",
            "({}) exited with {:?} after {:.2}s",
            label,
            status.code(),
            elapsed.as_secs_f64()
        );

        Ok(ToolCommandOutput {
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

async fn drain_stream<R>(
    reader: Option<R>,
    forward: bool,
    is_stderr: bool,
    label: &str,
) -> std::io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(String::new());
    };

    let mut reader = BufReader::new(reader);
    let mut collected = String::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&buf);
        let line = text.trim_end_matches(['\r', '\n']);

        if forward {
            if is_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        } else {
            debug!(target: "toolchain", "({}) {}", label, line);
        }

        collected.push_str(line);
        collected.push('\n');
    }

    Ok(collected)
}

/// Whether a process with the given id currently exists.
///
/// A process we are not allowed to signal still counts as alive.
#[cfg(unix)]
#[must_use]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }

    match kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Whether a process with the given id currently exists.
#[cfg(windows)]
#[must_use]
pub fn is_process_alive(pid: u32) -> bool {
    let output = std::process::Command::new("tasklist")
        .args(["/FI", &format!("PID eq {pid}"), "/NH", "/FO", "CSV"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output();

    match output {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains(&format!("\"{pid}\"")),
        // Cannot tell; err on the side of waiting
        Err(_) => true,
    }
}

/// Poll until `pid` no longer refers to a live process.
///
/// Returns `HandoffFailed` if the process is still alive after `max_wait`.
pub async fn wait_for_exit(pid: u32, poll_interval: Duration, max_wait: Duration) -> Result<()> {
    let start = Instant::now();
    let mut polls = 0u64;

    while is_process_alive(pid) {
        if start.elapsed() >= max_wait {
            return Err(WrapkitError::HandoffFailed {
                reason: format!(
                    "process {pid} still running after {} seconds",
                    max_wait.as_secs()
                ),
            }
            .into());
        }
        polls += 1;
        tokio::time::sleep(poll_interval).await;
    }

    debug!(target: "handoff", "Process {} exited (after {} polls)", pid, polls);
    Ok(())
}
