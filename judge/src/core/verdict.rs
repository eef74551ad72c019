use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a single sample case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Accepted
    Ac,
    /// Wrong Answer
    Wa,
    /// Time Limit Exceeded
    Tle,
    /// Runtime Error
    Re,
    /// Compile Error (reserved, never produced by the local classifier)
    Ce,
    /// Memory Limit Exceeded (reserved)
    Mle,
    /// Output Limit Exceeded (reserved)
    Ole,
    /// Internal Error: the case could not be evaluated
    Ie,
}

impl Verdict {
    pub fn code(&self) -> &'static str {
        match self {
            Verdict::Ac => "AC",
            Verdict::Wa => "WA",
            Verdict::Tle => "TLE",
            Verdict::Re => "RE",
            Verdict::Ce => "CE",
            Verdict::Mle => "MLE",
            Verdict::Ole => "OLE",
            Verdict::Ie => "IE",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Ac)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
