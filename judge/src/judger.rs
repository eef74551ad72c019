//! Judge engine: runs a solution against every sample of a problem
//!
//! Samples run strictly one after another, in ordinal order, and all of them
//! are always run. Whatever the program does (crash, hang, garbage output)
//! ends up as a verdict in the report; only a broken sample store aborts.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::checker::classify;
use crate::core::utils::preview;
use crate::core::Verdict;
use crate::error::Result;
use crate::runner::{CommandSpec, RunLimits, Runner};
use crate::samples::{SampleCase, SampleStore};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(2);
pub const DEFAULT_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct JudgeOptions {
    /// Per-case time limit used for the TLE verdict
    pub time_limit: Duration,
    /// Extra wall time granted before the runner kills the program
    pub grace: Duration,
}

impl JudgeOptions {
    fn run_limits(&self) -> RunLimits {
        RunLimits::wall(self.time_limit + self.grace)
    }
}

impl Default for JudgeOptions {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            grace: DEFAULT_GRACE,
        }
    }
}

/// Result of one sample case
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub ordinal: usize,
    pub verdict: Verdict,
    #[serde(with = "secs")]
    pub elapsed: Duration,
    /// None when the process never ran or was killed
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Expected output, kept for wrong answers only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl CaseResult {
    pub fn name(&self) -> String {
        format!("sample-{}", self.ordinal)
    }

    fn internal_error(ordinal: usize, message: String) -> Self {
        Self {
            ordinal,
            verdict: Verdict::Ie,
            elapsed: Duration::ZERO,
            exit_code: None,
            stdout: String::new(),
            stderr: message,
            expected: None,
        }
    }
}

/// Ordered results of judging one problem
#[derive(Debug, Clone, Serialize)]
pub struct JudgeReport {
    /// Problem name shown in the report header
    pub problem: String,
    pub command: String,
    pub work_dir: String,
    #[serde(with = "secs")]
    pub time_limit: Duration,
    pub results: Vec<CaseResult>,
}

impl JudgeReport {
    pub fn all_accepted(&self) -> bool {
        self.results.iter().all(|r| r.verdict.is_accepted())
    }

    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for result in &self.results {
            *counts.entry(result.verdict.to_string()).or_insert(0) += 1;
        }
        counts
    }

    pub fn max_elapsed(&self) -> Duration {
        self.results
            .iter()
            .map(|r| r.elapsed)
            .max()
            .unwrap_or_default()
    }

    /// Overall verdict: the first non-AC verdict, or AC
    pub fn verdict(&self) -> Verdict {
        self.results
            .iter()
            .map(|r| r.verdict)
            .find(|v| !v.is_accepted())
            .unwrap_or(Verdict::Ac)
    }
}

/// Judge every sample of `store` with `cmd`
pub async fn judge_samples<R: Runner + ?Sized>(
    runner: &R,
    problem: &str,
    cmd: &CommandSpec,
    store: &SampleStore,
    options: &JudgeOptions,
) -> Result<JudgeReport> {
    let cases = store.cases()?;
    info!(
        "Judging {} ({} samples from {}) with `{}`",
        problem,
        cases.len(),
        store.root().display(),
        cmd.display()
    );

    let mut results = Vec::with_capacity(cases.len());
    for case in &cases {
        let result = judge_case(runner, cmd, case, options).await;
        debug!(
            "{}: verdict={}, time={:.3}s",
            result.name(),
            result.verdict,
            result.elapsed.as_secs_f64()
        );
        results.push(result);
    }

    let report = JudgeReport {
        problem: problem.to_string(),
        command: cmd.display(),
        work_dir: cmd
            .work_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default(),
        time_limit: options.time_limit,
        results,
    };

    info!(
        "Judge summary: problem={}, verdict={}, samples={}, max_time={:.3}s",
        problem,
        report.verdict(),
        report.results.len(),
        report.max_elapsed().as_secs_f64()
    );

    Ok(report)
}

async fn judge_case<R: Runner + ?Sized>(
    runner: &R,
    cmd: &CommandSpec,
    case: &SampleCase,
    options: &JudgeOptions,
) -> CaseResult {
    let (input, expected) = match (case.read_input(), case.read_expected()) {
        (Ok(input), Ok(expected)) => (input, expected),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Cannot read {}: {}", case.name(), e);
            return CaseResult::internal_error(case.ordinal, e.to_string());
        }
    };

    let outcome = match runner.run(cmd, &options.run_limits(), Some(&input)).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Failed to run {}: {:#}", case.name(), e);
            return CaseResult::internal_error(case.ordinal, format!("{:#}", e));
        }
    };

    let verdict = classify(&outcome, &expected, options.time_limit);
    if verdict == Verdict::Re && !outcome.stderr.is_empty() {
        debug!("{} stderr: {}", case.name(), preview(&outcome.stderr, 200));
    }

    CaseResult {
        ordinal: case.ordinal,
        verdict,
        elapsed: outcome.elapsed,
        exit_code: outcome.exit_code(),
        stdout: outcome.stdout,
        stderr: outcome.stderr,
        expected: (verdict == Verdict::Wa).then_some(expected),
    }
}

mod secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{LocalRunner, RunOutcome, RunStatus};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn square_store() -> (tempfile::TempDir, SampleStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::create(dir.path()).unwrap();
        store.add_case("3\n", "9\n").unwrap();
        (dir, store)
    }

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::from_argv(["sh", "-c", script])
    }

    #[tokio::test]
    async fn test_square_accepted() {
        let (_dir, store) = square_store();
        let report = judge_samples(
            &LocalRunner::default(),
            "abc100_a",
            &sh("read n; echo $((n * n))"),
            &store,
            &JudgeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.results.len(), 1);
        let result = &report.results[0];
        assert_eq!(result.verdict, Verdict::Ac);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.elapsed < Duration::from_secs(2));
        assert!(report.all_accepted());
    }

    #[tokio::test]
    async fn test_sleeping_solution_is_tle() {
        let (_dir, store) = square_store();
        let report = judge_samples(
            &LocalRunner::default(),
            "abc100_a",
            &sh("read n; sleep 3; echo $((n * n))"),
            &store,
            &JudgeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.results[0].verdict, Verdict::Tle);
        assert!(report.results[0].elapsed > Duration::from_secs(2));
        assert_eq!(report.verdict(), Verdict::Tle);
    }

    #[tokio::test]
    async fn test_failing_solution_is_re() {
        let (_dir, store) = square_store();
        let report = judge_samples(
            &LocalRunner::default(),
            "abc100_a",
            &sh("exit 1"),
            &store,
            &JudgeOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.results[0].verdict, Verdict::Re);
        assert_eq!(report.results[0].exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_wrong_answer_keeps_expected() {
        let (_dir, store) = square_store();
        let report = judge_samples(
            &LocalRunner::default(),
            "abc100_a",
            &sh("echo 8"),
            &store,
            &JudgeOptions::default(),
        )
        .await
        .unwrap();

        let result = &report.results[0];
        assert_eq!(result.verdict, Verdict::Wa);
        assert_eq!(result.expected.as_deref(), Some("9\n"));
        assert_eq!(result.stdout, "8\n");
    }

    /// Replays scripted outcomes and records the inputs it was fed
    struct ScriptedRunner {
        outcomes: Mutex<Vec<anyhow::Result<RunOutcome>>>,
        inputs: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(mut outcomes: Vec<anyhow::Result<RunOutcome>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                inputs: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Runner for ScriptedRunner {
        async fn run(
            &self,
            _cmd: &CommandSpec,
            _limits: &RunLimits,
            stdin: Option<&str>,
        ) -> anyhow::Result<RunOutcome> {
            self.inputs
                .lock()
                .unwrap()
                .push(stdin.unwrap_or_default().to_string());
            self.outcomes.lock().unwrap().pop().unwrap()
        }
    }

    fn exited(code: i32, ms: u64, stdout: &str) -> anyhow::Result<RunOutcome> {
        Ok(RunOutcome {
            status: RunStatus::Exited(code),
            elapsed: Duration::from_millis(ms),
            stdout: stdout.to_string(),
            stderr: String::new(),
        })
    }

    #[tokio::test]
    async fn test_all_samples_run_in_order_without_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::create(dir.path()).unwrap();
        for n in 0..5 {
            store
                .add_case(&format!("{}\n", n), &format!("{}\n", n * n))
                .unwrap();
        }

        let runner = ScriptedRunner::new(vec![
            exited(0, 10, "0\n"),
            exited(1, 10, ""),
            Err(anyhow::anyhow!("spawn failed")),
            exited(0, 2500, "9\n"),
            exited(0, 10, "15\n"),
        ]);
        let report = judge_samples(
            &runner,
            "abc100_a",
            &CommandSpec::parse("./main"),
            &store,
            &JudgeOptions::default(),
        )
        .await
        .unwrap();

        let verdicts: Vec<Verdict> = report.results.iter().map(|r| r.verdict).collect();
        assert_eq!(
            verdicts,
            vec![Verdict::Ac, Verdict::Re, Verdict::Ie, Verdict::Tle, Verdict::Wa]
        );
        let ordinals: Vec<usize> = report.results.iter().map(|r| r.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            *runner.inputs.lock().unwrap(),
            vec!["0\n", "1\n", "2\n", "3\n", "4\n"]
        );
        assert_eq!(report.verdict(), Verdict::Re);
        assert_eq!(report.counts().get("AC"), Some(&1));
        assert_eq!(report.max_elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_invalid_store_aborts_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let store = SampleStore::create(dir.path()).unwrap();
        std::fs::write(store.input_path(0), "1\n").unwrap();

        let runner = ScriptedRunner::new(vec![]);
        let result = judge_samples(
            &runner,
            "abc100_a",
            &CommandSpec::parse("./main"),
            &store,
            &JudgeOptions::default(),
        )
        .await;

        assert!(result.is_err());
        assert!(runner.inputs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_time_limit() {
        let (_dir, store) = square_store();
        let runner = ScriptedRunner::new(vec![exited(0, 600, "9\n")]);
        let report = judge_samples(
            &runner,
            "abc100_a",
            &CommandSpec::parse("./main"),
            &store,
            &JudgeOptions {
                time_limit: Duration::from_millis(500),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(report.results[0].verdict, Verdict::Tle);
    }
}
