//! Submission poller
//!
//! After a remote submission the judge status is polled on a fixed interval:
//!
//! ```text
//! Pending --> Judging --> Done
//!    \           \
//!     `-----------`-----> TimedOut   (attempts exhausted)
//! ```
//!
//! Labels from the pending or judging marker sets keep the poller waiting;
//! any other label is final. Running out of attempts is not an error: the
//! submission is left alone and the outcome is reported as unknown.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::runner::{CommandSpec, LocalRunner};

/// One reading of the remote status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionStatus {
    pub label: String,
    /// Remaining columns of the submission row, for display
    pub columns: Vec<String>,
}

impl SubmissionStatus {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            columns: Vec::new(),
        }
    }

    /// Parse `label<TAB>column<TAB>column...`
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim_end_matches(['\r', '\n']).split('\t');
        let label = parts.next()?.trim();
        if label.is_empty() {
            return None;
        }
        let mut status = Self::new(label);
        status.columns = parts.map(|c| c.trim().to_string()).collect();
        Some(status)
    }

    pub fn line(&self) -> String {
        if self.columns.is_empty() {
            self.label.clone()
        } else {
            format!("{} {}", self.label, self.columns.join(" | "))
        }
    }
}

/// Where status readings come from (the networking side)
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch(&self) -> Result<SubmissionStatus>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Judging,
    Done,
    TimedOut,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Done | PollState::TimedOut)
    }
}

/// Labels that mean "not finished yet"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitingMarkers {
    pub pending: Vec<String>,
    pub judging: Vec<String>,
}

impl WaitingMarkers {
    pub fn state_of(&self, label: &str) -> PollState {
        if self.pending.iter().any(|m| m == label) {
            PollState::Pending
        } else if self.judging.iter().any(|m| m == label) {
            PollState::Judging
        } else {
            PollState::Done
        }
    }
}

impl Default for WaitingMarkers {
    fn default() -> Self {
        Self {
            pending: vec![
                "ジャッジ待ち".to_string(),
                "WJ".to_string(),
                "Waiting for Judging".to_string(),
            ],
            judging: vec!["ジャッジ中".to_string(), "Judging".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: usize,
    pub markers: WaitingMarkers,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 12,
            markers: WaitingMarkers::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollReport {
    /// State after every successful poll, then `TimedOut` if it came to that
    pub transitions: Vec<PollState>,
    pub final_state: PollState,
    pub last_status: Option<SubmissionStatus>,
    pub attempts: usize,
}

pub struct SubmissionPoller {
    config: PollConfig,
}

impl SubmissionPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub async fn poll<S: StatusSource + ?Sized>(&self, source: &S) -> PollReport {
        let mut transitions = Vec::new();
        let mut state = PollState::Pending;
        let mut last_status = None;

        for attempt in 1..=self.config.max_attempts {
            match source.fetch().await {
                Ok(status) => {
                    state = self.config.markers.state_of(&status.label);
                    debug!("Poll {}: {:?} ({})", attempt, state, status.label);
                    info!("{}", status.line());
                    transitions.push(state);
                    last_status = Some(status);
                }
                Err(e) => {
                    warn!("Failed to fetch submission status (poll {}): {:#}", attempt, e);
                }
            }

            if state.is_terminal() {
                return PollReport {
                    transitions,
                    final_state: state,
                    last_status,
                    attempts: attempt,
                };
            }
            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        warn!(
            "Judging did not finish after {} polls ({:.0}s)",
            self.config.max_attempts,
            self.config.interval.as_secs_f64() * self.config.max_attempts as f64
        );
        transitions.push(PollState::TimedOut);
        PollReport {
            transitions,
            final_state: PollState::TimedOut,
            last_status,
            attempts: self.config.max_attempts,
        }
    }
}

/// Status source backed by an external command printing
/// `label<TAB>columns...` on its first line
pub struct CommandStatusSource {
    runner: LocalRunner,
    command: CommandSpec,
    timeout: Duration,
}

impl CommandStatusSource {
    pub fn new(command: CommandSpec, timeout: Duration) -> Self {
        Self {
            runner: LocalRunner::new(timeout),
            command,
            timeout,
        }
    }
}

#[async_trait]
impl StatusSource for CommandStatusSource {
    async fn fetch(&self) -> Result<SubmissionStatus> {
        let outcome = self
            .runner
            .execute(&self.command, None, self.timeout)
            .await
            .context("Failed to run status command")?;
        if !outcome.is_success() {
            bail!(
                "Status command failed ({:?}): {}",
                outcome.status,
                outcome.stderr.trim()
            );
        }
        let first_line = outcome.stdout.lines().next().unwrap_or_default();
        SubmissionStatus::parse(first_line)
            .with_context(|| format!("Status command printed no label: {:?}", outcome.stdout))
    }
}
