//! Verdict classification for a single sample run
//!
//! Rules are applied in a fixed order and the first match wins:
//!
//! 1. the runner killed the program on timeout -> `TLE`
//! 2. non-zero exit code or death by signal -> `RE`
//! 3. elapsed wall time above the limit -> `TLE`
//! 4. output differs from the expected answer -> `WA`
//! 5. otherwise -> `AC`
//!
//! Output comparison ignores trailing whitespace at the very end of the text
//! (so a missing final newline is fine) and nothing else.

use std::time::Duration;

use crate::core::Verdict;
use crate::runner::{RunOutcome, RunStatus};

/// Classify one run against its expected output
pub fn classify(outcome: &RunOutcome, expected: &str, time_limit: Duration) -> Verdict {
    match outcome.status {
        RunStatus::TimedOut => Verdict::Tle,
        RunStatus::Exited(code) if code != 0 => Verdict::Re,
        RunStatus::Signaled(_) => Verdict::Re,
        RunStatus::Exited(_) if outcome.elapsed > time_limit => Verdict::Tle,
        RunStatus::Exited(_) if !compare_output(&outcome.stdout, expected) => Verdict::Wa,
        RunStatus::Exited(_) => Verdict::Ac,
    }
}

/// Characters ignored at the end of both outputs
const TRAILING_WHITESPACE: [char; 4] = [' ', '\t', '\r', '\n'];

/// Compare program output with expected output
pub fn compare_output(actual: &str, expected: &str) -> bool {
    actual.trim_end_matches(TRAILING_WHITESPACE) == expected.trim_end_matches(TRAILING_WHITESPACE)
}
