//! Error types for problem lookup and sample loading
//!
//! Anything that goes wrong while turning a user reference into a concrete
//! problem (or its sample files) is a `ProblemError`. These abort the current
//! operation before any process is spawned. Failures of the judged program
//! itself are never errors; they become verdicts.

use std::fmt;
use std::path::PathBuf;

/// One entry offered back to the user when a key matches several problems
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Position of the entry in the problem index
    pub position: usize,
    pub name: String,
    pub contest_url: String,
}

/// Candidate list formatted as `NN | name - contest_url` lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateList(pub Vec<Candidate>);

impl fmt::Display for CandidateList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for candidate in &self.0 {
            writeln!(
                f,
                "{:02} | {} - {}",
                candidate.position, candidate.name, candidate.contest_url
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProblemError {
    /// No problem matched, or the index / sample directory is missing
    #[error("problems not found: {0}")]
    ProblemsNotFound(String),
    /// More than one problem matched the key
    #[error("ambiguous problem name: {key}\n\n{candidates}\nPlease specify the problem name.")]
    AmbiguousProblem {
        key: String,
        candidates: CandidateList,
    },
    /// An input sample has no matching expected output
    #[error("sample {ordinal} has no expected output at {}", .expected.display())]
    InvalidSample { ordinal: usize, expected: PathBuf },
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed problem index {}: {source}", .path.display())]
    MalformedIndex {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ProblemError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ProblemError::ProblemsNotFound(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProblemError::Io {
            path: path.into(),
            source,
        }
    }

    /// Candidates carried by an ambiguity error, empty otherwise
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            ProblemError::AmbiguousProblem { candidates, .. } => &candidates.0,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ProblemError>;
