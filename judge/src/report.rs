//! Plain-text rendering of a judge report

use std::fmt;

use crate::core::Verdict;
use crate::judger::{CaseResult, JudgeReport};

const RULE: usize = 32;

impl fmt::Display for JudgeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.problem.chars().count() + RULE * 2 + 2;
        writeln!(f, "{} {} {}", "-".repeat(RULE), self.problem, "-".repeat(RULE))?;
        writeln!(f, "- Execute Directory:  '{}'", self.work_dir)?;
        writeln!(f, "- Execute Command:    \"{}\"", self.command)?;
        writeln!(f, "{}", "-".repeat(width))?;
        for result in &self.results {
            write_case(f, result)?;
        }
        writeln!(f, "{}", "-".repeat(width))?;

        let counts = self.counts();
        let accepted = counts.get(Verdict::Ac.code()).copied().unwrap_or(0);
        write!(
            f,
            "{} {}/{} (max time: {:.2} [sec])",
            self.verdict(),
            accepted,
            self.results.len(),
            self.max_elapsed().as_secs_f64()
        )?;
        if accepted < self.results.len() {
            let breakdown: Vec<String> = counts
                .iter()
                .map(|(verdict, count)| format!("{}: {}", verdict, count))
                .collect();
            write!(f, " [{}]", breakdown.join(", "))?;
        }
        Ok(())
    }
}

fn write_case(f: &mut fmt::Formatter<'_>, result: &CaseResult) -> fmt::Result {
    write!(f, " {:<10} [ {} ]", result.name(), result.verdict)?;
    match result.verdict {
        Verdict::Ac | Verdict::Tle => {
            writeln!(f, "        time: {:.2} [sec]", result.elapsed.as_secs_f64())
        }
        Verdict::Wa => {
            writeln!(f)?;
            writeln!(f, "Expected:")?;
            writeln!(f, "{}", result.expected.as_deref().unwrap_or_default().trim_end())?;
            writeln!(f, "Got:")?;
            writeln!(f, "{}", result.stdout.trim_end())
        }
        Verdict::Re => {
            match result.exit_code {
                Some(code) => writeln!(f, " return code: {}", code)?,
                None => writeln!(f, " killed by signal")?,
            }
            write_block(f, &result.stderr)
        }
        _ => {
            writeln!(f)?;
            write_block(f, &result.stderr)
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let text = text.trim_end();
    if text.is_empty() {
        Ok(())
    } else {
        writeln!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(ordinal: usize, verdict: Verdict) -> CaseResult {
        CaseResult {
            ordinal,
            verdict,
            elapsed: Duration::from_millis(10),
            exit_code: Some(0),
            stdout: "8\n".into(),
            stderr: String::new(),
            expected: None,
        }
    }

    fn report(results: Vec<CaseResult>) -> JudgeReport {
        JudgeReport {
            problem: "abc100_a".into(),
            command: "python main.py".into(),
            work_dir: "/work/00-abc100_a".into(),
            time_limit: Duration::from_secs(2),
            results,
        }
    }

    #[test]
    fn test_accepted_report() {
        let text = report(vec![result(0, Verdict::Ac), result(1, Verdict::Ac)]).to_string();
        assert!(text.contains("- Execute Command:    \"python main.py\""));
        assert!(text.contains(" sample-0   [ AC ]        time: 0.01 [sec]"));
        assert!(text.ends_with("AC 2/2 (max time: 0.01 [sec])"));
    }

    #[test]
    fn test_failure_details() {
        let mut wa = result(0, Verdict::Wa);
        wa.expected = Some("9\n".into());
        let mut re = result(1, Verdict::Re);
        re.exit_code = Some(1);
        re.stderr = "Traceback: boom\n".into();
        let mut ie = result(2, Verdict::Ie);
        ie.stderr = "Failed to spawn python".into();

        let text = report(vec![wa, re, ie]).to_string();
        assert!(text.contains("Expected:\n9\nGot:\n8\n"));
        assert!(text.contains("[ RE ] return code: 1\nTraceback: boom\n"));
        assert!(text.contains("[ IE ]\nFailed to spawn python\n"));
        assert!(text.ends_with("WA 0/3 (max time: 0.01 [sec]) [IE: 1, RE: 1, WA: 1]"));
    }
}
