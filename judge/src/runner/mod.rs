//! Process runner
//!
//! Runs a solution command once: feeds its stdin, collects stdout and stderr,
//! measures wall time and stops it at a deadline. Whether the output is right
//! is the checker's business, and where the samples live is the judger's.

pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// argv of a solution plus the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Inherits the caller's directory when unset
    pub work_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Build from an argv; an empty argv gives an empty command
    pub fn from_argv<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        Self {
            program: argv.next().unwrap_or_default(),
            args: argv.collect(),
            work_dir: None,
        }
    }

    /// Split a command line on whitespace, e.g. `"python3 main.py"`.
    /// No shell quoting is interpreted.
    pub fn parse(command_line: &str) -> Self {
        Self::from_argv(command_line.split_whitespace())
    }

    pub fn with_work_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.work_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    /// Command line as shown in reports
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunLimits {
    /// Wall-clock deadline; the process group is killed when it passes
    pub wall_time: Duration,
}

impl RunLimits {
    pub fn wall(wall_time: Duration) -> Self {
        Self { wall_time }
    }
}

/// How the process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Exited(i32),
    /// Terminated by this signal number
    Signaled(i32),
    /// Still running at the deadline, killed by the runner
    TimedOut,
}

/// Everything observed about one run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// From spawn until exit, or until the kill on timeout
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    /// Exit code, if the process exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            RunStatus::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Exited(0)
    }
}

/// Seam between the judger and process execution
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run `cmd` once with `stdin` as its whole input
    async fn run(
        &self,
        cmd: &CommandSpec,
        limits: &RunLimits,
        stdin: Option<&str>,
    ) -> Result<RunOutcome>;
}

pub use local::LocalRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let cmd = CommandSpec::parse("  python3   main.py --fast ");
        assert_eq!(cmd.program, "python3");
        assert_eq!(cmd.args, vec!["main.py", "--fast"]);
        assert_eq!(cmd.display(), "python3 main.py --fast");
    }

    #[test]
    fn test_empty_command() {
        assert!(CommandSpec::parse("   ").is_empty());
        assert!(CommandSpec::from_argv(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_exit_code() {
        let mut outcome = RunOutcome {
            status: RunStatus::TimedOut,
            elapsed: Duration::from_secs(3),
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(outcome.exit_code(), None);
        assert!(!outcome.is_success());

        outcome.status = RunStatus::Exited(0);
        assert_eq!(outcome.exit_code(), Some(0));
        assert!(outcome.is_success());
    }
}
