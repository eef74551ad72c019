//! Contest and problem model
//!
//! A `Problem` refers to its contest by name only; the owning `Contest` is
//! the one that answers lookups (`Contest::problem`).

use anyhow::{bail, Context};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::index::{ContestRef, IndexEntry, ProblemIndex};

pub const CONTEST_BASE_URL: &str = "https://atcoder.jp/contests";

#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Name of the owning contest
    pub contest: String,
    /// Problem letter ("A", "B", ...)
    pub difficulty: String,
    /// Task slug, e.g. `abc100_a`
    pub name: String,
    pub title: String,
    pub point: u32,
    pub url: String,
    /// Directory inside the contest directory, assigned by `Contest::add_problem`
    pub root_dir: PathBuf,
    pub is_interactive: bool,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Problem {}", self.contest.to_uppercase())?;
        if !self.difficulty.is_empty() {
            write!(f, " -{}", self.difficulty)?;
        }
        write!(f, " '{}' - {} [pts] ({})>", self.title, self.point, self.url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contest {
    pub name: String,
    pub url: String,
    problems: Vec<Problem>,
    points: BTreeMap<String, u32>,
}

impl Contest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            problems: Vec::new(),
            points: BTreeMap::new(),
        }
    }

    /// Accepts either a full contest URL or a bare contest id
    pub fn from_url(contest: &str) -> Self {
        let contest = contest.trim_end_matches('/');
        let url = if contest.contains("/contests/") {
            contest.to_string()
        } else {
            format!("{}/{}", CONTEST_BASE_URL, contest)
        };
        let name = url.rsplit('/').next().unwrap_or_default().to_string();
        Self::new(name, url)
    }

    /// Problem skeleton for a letter, following the usual task URL layout
    pub fn task(&self, letter: &str, point: u32) -> Problem {
        let name = format!("{}_{}", self.name, letter.to_lowercase());
        Problem {
            contest: self.name.clone(),
            difficulty: letter.to_uppercase(),
            url: format!("{}/tasks/{}", self.url, name),
            root_dir: PathBuf::new(),
            name,
            title: String::new(),
            point,
            is_interactive: false,
        }
    }

    /// Add or replace the problem with the same letter
    pub fn add_problem(&mut self, mut problem: Problem) {
        problem.contest = self.name.clone();
        self.points
            .insert(problem.difficulty.clone(), problem.point);
        match self
            .problems
            .iter()
            .position(|p| p.difficulty == problem.difficulty)
        {
            Some(position) => {
                problem.root_dir = PathBuf::from(Self::problem_dir_name(position, &problem));
                self.problems[position] = problem;
            }
            None => {
                problem.root_dir =
                    PathBuf::from(Self::problem_dir_name(self.problems.len(), &problem));
                self.problems.push(problem);
            }
        }
    }

    /// Add a task from `A` or `A:100` (letter, then point); letters must be new
    pub fn add_task(&mut self, spec: &str) -> anyhow::Result<&Problem> {
        let (letter, point) = match spec.split_once(':') {
            Some((letter, point)) => {
                let point = point
                    .parse()
                    .with_context(|| format!("Invalid point in {:?}", spec))?;
                (letter, point)
            }
            None => (spec, 0),
        };
        if letter.is_empty() || !letter.chars().all(|c| c.is_ascii_alphanumeric()) {
            bail!("Invalid problem letter {:?}", letter);
        }
        if let Some(existing) = self.problem(letter) {
            bail!("Problem {} is listed twice", existing.difficulty);
        }

        let task = self.task(letter, point);
        self.add_problem(task);
        self.problem(letter)
            .with_context(|| format!("Problem {} was not added", letter))
    }

    /// Look up by letter (case-insensitive) or by task slug
    pub fn problem(&self, key: &str) -> Option<&Problem> {
        self.problems
            .iter()
            .find(|p| p.difficulty.eq_ignore_ascii_case(key) || p.name == key)
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn points(&self) -> &BTreeMap<String, u32> {
        &self.points
    }

    pub fn reference(&self) -> ContestRef {
        ContestRef {
            name: self.name.clone(),
            url: self.url.clone(),
        }
    }

    /// Directory name of the `position`-th problem inside a download
    pub fn problem_dir_name(position: usize, problem: &Problem) -> String {
        format!("{:02}-{}", position, problem.name)
    }

    /// Index of all problems, with directories relative to the contest dir
    pub fn to_index(&self) -> ProblemIndex {
        let mut index = ProblemIndex::new();
        for problem in &self.problems {
            index.insert(IndexEntry {
                contest: self.reference(),
                name: problem.name.clone(),
                title: problem.title.clone(),
                url: problem.url.clone(),
                root_dir: problem.root_dir.to_string_lossy().into_owned(),
                difficulty: problem.difficulty.clone(),
                point: problem.point,
                is_interactive: problem.is_interactive,
            });
        }
        index
    }
}

impl fmt::Display for Contest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Contest {} {}>", self.name.to_uppercase(), self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc100() -> Contest {
        let mut contest = Contest::from_url("abc100");
        for (letter, point) in [("A", 100), ("B", 200), ("C", 300)] {
            let task = contest.task(letter, point);
            contest.add_problem(task);
        }
        contest
    }

    #[test]
    fn test_from_url() {
        let contest = Contest::from_url("https://atcoder.jp/contests/abc100/");
        assert_eq!(contest.name, "abc100");
        assert_eq!(contest.url, "https://atcoder.jp/contests/abc100");

        let contest = Contest::from_url("arc050");
        assert_eq!(contest.url, "https://atcoder.jp/contests/arc050");
    }

    #[test]
    fn test_keyed_lookup() {
        let contest = abc100();
        assert_eq!(contest.problem("a").unwrap().name, "abc100_a");
        assert_eq!(contest.problem("B").unwrap().point, 200);
        assert_eq!(contest.problem("abc100_c").unwrap().difficulty, "C");
        assert!(contest.problem("d").is_none());
        assert_eq!(contest.points().get("C"), Some(&300));
    }

    #[test]
    fn test_problem_refers_to_contest_by_name() {
        let contest = abc100();
        let problem = contest.problem("a").unwrap();
        assert_eq!(problem.contest, contest.name);
        assert_eq!(
            problem.url,
            "https://atcoder.jp/contests/abc100/tasks/abc100_a"
        );
    }

    #[test]
    fn test_add_task_specs() {
        let mut contest = Contest::from_url("abc100");
        assert_eq!(contest.add_task("A:100").unwrap().point, 100);
        assert_eq!(contest.add_task("b").unwrap().name, "abc100_b");

        assert!(contest.add_task("a").is_err());
        assert!(contest.add_task("C:many").is_err());
        assert!(contest.add_task("").is_err());
        assert!(contest.add_task("../x").is_err());

        assert_eq!(contest.problems().len(), 2);
        assert_eq!(contest.points().get("A"), Some(&100));
        assert_eq!(contest.points().get("B"), Some(&0));
    }

    #[test]
    fn test_add_problem_replaces_same_letter() {
        let mut contest = abc100();
        let mut retitled = contest.task("a", 150);
        retitled.title = "Happy Birthday!".into();
        contest.add_problem(retitled);

        assert_eq!(contest.problems().len(), 3);
        assert_eq!(contest.problem("A").unwrap().title, "Happy Birthday!");
        assert_eq!(contest.problem("A").unwrap().root_dir, PathBuf::from("00-abc100_a"));
        assert_eq!(contest.points().get("A"), Some(&150));
    }

    #[test]
    fn test_to_index_uses_numbered_dirs() {
        let index = abc100().to_index();
        let dirs: Vec<&str> = index.iter().map(|(_, e)| e.root_dir.as_str()).collect();
        assert_eq!(dirs, vec!["00-abc100_a", "01-abc100_b", "02-abc100_c"]);
        assert_eq!(index.get("abc100_b").unwrap().1.contest.name, "abc100");
    }

    #[test]
    fn test_display() {
        let contest = abc100();
        assert_eq!(
            contest.problem("a").unwrap().to_string(),
            "<Problem ABC100 -A '' - 100 [pts] (https://atcoder.jp/contests/abc100/tasks/abc100_a)>"
        );
        assert_eq!(
            contest.to_string(),
            "<Contest ABC100 https://atcoder.jp/contests/abc100>"
        );
    }
}
