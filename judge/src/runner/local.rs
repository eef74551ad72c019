//! Local runner implementation
//!
//! Executes the solution directly, one process at a time. The child is put in
//! its own process group so that a timeout (or a cancelled judge) can take
//! down everything it spawned, e.g. the program behind `sh -c`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{CommandSpec, RunLimits, RunOutcome, RunStatus, Runner};

/// Runner that spawns the command on the local machine
pub struct LocalRunner {
    /// Timeout applied by `Runner::run` when the limits carry none
    default_timeout: Duration,
}

impl LocalRunner {
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    /// Run a program, feeding `stdin_content` and collecting its output
    pub async fn execute(
        &self,
        cmd: &CommandSpec,
        stdin_content: Option<&str>,
        timeout: Duration,
    ) -> Result<RunOutcome> {
        if cmd.is_empty() {
            bail!("No command specified for execution");
        }
        if timeout.is_zero() {
            bail!("Timeout must be greater than zero");
        }
        if let Some(dir) = &cmd.work_dir {
            if !dir.is_dir() {
                bail!("Working directory does not exist: {}", dir.display());
            }
        }

        debug!(
            "Running program: {:?} with args: {:?} in {:?}",
            cmd.program, cmd.args, cmd.work_dir
        );

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);
        if let Some(dir) = &cmd.work_dir {
            command.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn {}", cmd.program))?;
        let group = ProcessGroupGuard::new(child.id());

        let stdin = child.stdin.take();
        let input = stdin_content.unwrap_or_default().as_bytes().to_vec();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // The program may exit without reading its input
                if let Err(e) = stdin.write_all(&input).await {
                    debug!("Failed to write stdin: {}", e);
                }
            }
        };
        let wait = async move {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let waited = tokio::time::timeout(timeout, wait).await;
        match waited {
            Ok(output) => {
                let output = output.context("Failed to wait for program")?;
                let elapsed = start.elapsed();
                // Whatever the program left in the background goes with it
                drop(group);

                let status = match output.status.code() {
                    Some(code) => RunStatus::Exited(code),
                    None => {
                        use std::os::unix::process::ExitStatusExt;
                        RunStatus::Signaled(output.status.signal().unwrap_or(-1))
                    }
                };

                Ok(RunOutcome {
                    status,
                    elapsed,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                })
            }
            Err(_) => {
                let elapsed = start.elapsed();
                warn!(
                    "Program {} timed out after {:.2}s, killing it",
                    cmd.display(),
                    elapsed.as_secs_f64()
                );
                drop(group);

                Ok(RunOutcome {
                    status: RunStatus::TimedOut,
                    elapsed,
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
        }
    }
}

impl Default for LocalRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome> {
        let timeout = if limits.wall_time.is_zero() {
            self.default_timeout
        } else {
            limits.wall_time
        };
        self.execute(cmd, stdin, timeout).await
    }
}

/// Kills the child's process group when dropped.
///
/// `kill_on_drop` only reaches the direct child; this reaches its
/// descendants as well, including ones still running after a normal exit.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                Err(e) => warn!("Failed to kill process group {}: {}", pgid, e),
            }
        }
    }
}
