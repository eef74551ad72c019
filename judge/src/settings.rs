//! Settings
//!
//! Loaded once in `main` from a TOML file (or the built-in defaults), then
//! overridden from the environment, and passed by reference to whatever
//! needs it. There is no global configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::judger::JudgeOptions;
use crate::poller::{PollConfig, WaitingMarkers};

const BUILTIN_SETTINGS: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/settings.toml"));

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Command used when `-c` is not given
    pub command: String,
    pub time_limit_ms: u64,
    pub grace_ms: u64,
    pub run_timeout_secs: u64,
    /// Workspace marker directory name
    pub cache_dir: String,
    pub language_id: u32,
    pub poll: PollSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub attempts: usize,
    pub status_timeout_secs: u64,
    pub pending_markers: Vec<String>,
    pub judging_markers: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command: "python main.py".to_string(),
            time_limit_ms: 2000,
            grace_ms: 1000,
            run_timeout_secs: 60,
            cache_dir: ".acp".to_string(),
            language_id: 5055,
            poll: PollSettings::default(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        let markers = WaitingMarkers::default();
        Self {
            interval_secs: 5,
            attempts: 12,
            status_timeout_secs: 30,
            pending_markers: markers.pending,
            judging_markers: markers.judging,
        }
    }
}

impl Settings {
    /// Read `path` if given, else the built-in defaults, then apply
    /// `ACP_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read settings from {}", path.display()))?;
                let settings: Settings = toml::from_str(&content)
                    .with_context(|| format!("Settings file {} is invalid", path.display()))?;
                info!("Loaded settings from {}", path.display());
                settings
            }
            None => toml::from_str(BUILTIN_SETTINGS).context("Built-in settings are invalid")?,
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Override fields from `ACP_COMMAND`, `ACP_TIME_LIMIT_MS`,
    /// `ACP_POLL_INTERVAL_SECS` and `ACP_POLL_ATTEMPTS`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(command) = lookup("ACP_COMMAND") {
            self.command = command;
        }
        if let Some(value) = lookup("ACP_TIME_LIMIT_MS") {
            self.time_limit_ms = value
                .parse()
                .with_context(|| format!("Invalid ACP_TIME_LIMIT_MS: {}", value))?;
        }
        if let Some(value) = lookup("ACP_POLL_INTERVAL_SECS") {
            self.poll.interval_secs = value
                .parse()
                .with_context(|| format!("Invalid ACP_POLL_INTERVAL_SECS: {}", value))?;
        }
        if let Some(value) = lookup("ACP_POLL_ATTEMPTS") {
            self.poll.attempts = value
                .parse()
                .with_context(|| format!("Invalid ACP_POLL_ATTEMPTS: {}", value))?;
        }
        Ok(())
    }

    pub fn judge_options(&self) -> JudgeOptions {
        JudgeOptions {
            time_limit: Duration::from_millis(self.time_limit_ms),
            grace: Duration::from_millis(self.grace_ms),
        }
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.poll.interval_secs),
            max_attempts: self.poll.attempts,
            markers: WaitingMarkers {
                pending: self.poll.pending_markers.clone(),
                judging: self.poll.judging_markers.clone(),
            },
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_builtin_matches_defaults() {
        let builtin: Settings = toml::from_str(BUILTIN_SETTINGS).unwrap();
        assert_eq!(builtin, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
command = "./a.out"

[poll]
attempts = 3
"#,
        )
        .unwrap();
        assert_eq!(settings.command, "./a.out");
        assert_eq!(settings.time_limit_ms, 2000);
        assert_eq!(settings.poll.attempts, 3);
        assert_eq!(settings.poll.interval_secs, 5);
        assert_eq!(settings.poll_config().markers, WaitingMarkers::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("ACP_COMMAND", "pypy3 main.py"),
            ("ACP_TIME_LIMIT_MS", "500"),
            ("ACP_POLL_ATTEMPTS", "2"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.command, "pypy3 main.py");
        assert_eq!(
            settings.judge_options().time_limit,
            Duration::from_millis(500)
        );
        assert_eq!(settings.poll_config().max_attempts, 2);
    }

    #[test]
    fn test_invalid_override() {
        let mut settings = Settings::default();
        let result = settings.apply_overrides(|key| {
            (key == "ACP_TIME_LIMIT_MS").then(|| "two seconds".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acp.toml");
        std::fs::write(&path, "time_limit_ms = 3000\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.time_limit_ms, 3000);
        assert!(Settings::load(Some(dir.path().join("missing.toml").as_path())).is_err());
    }
}
