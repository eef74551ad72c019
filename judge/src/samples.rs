//! Sample store: paired input / expected-output files of one problem
//!
//! Layout under the problem root:
//!
//! ```text
//! <root>/in/sample-0.in    <root>/out/sample-0.out
//! <root>/in/sample-1.in    <root>/out/sample-1.out
//! ```
//!
//! Cases are discovered from ordinal 0 upwards and stop at the first missing
//! input. An input without its output makes the whole store invalid.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ProblemError, Result};

pub const INPUT_DIR: &str = "in";
pub const OUTPUT_DIR: &str = "out";

/// One input / expected-output pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCase {
    pub ordinal: usize,
    pub input: PathBuf,
    pub expected: PathBuf,
}

impl SampleCase {
    pub fn name(&self) -> String {
        format!("sample-{}", self.ordinal)
    }

    pub fn read_input(&self) -> Result<String> {
        std::fs::read_to_string(&self.input).map_err(|e| ProblemError::io(&self.input, e))
    }

    pub fn read_expected(&self) -> Result<String> {
        std::fs::read_to_string(&self.expected).map_err(|e| ProblemError::io(&self.expected, e))
    }
}

#[derive(Debug, Clone)]
pub struct SampleStore {
    root: PathBuf,
}

impl SampleStore {
    /// Open the store of an existing problem directory
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.join(INPUT_DIR).is_dir() {
            return Err(ProblemError::not_found(format!(
                "Failed to find samples in {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Create the `in/` and `out/` directories if needed
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        for dir in [INPUT_DIR, OUTPUT_DIR] {
            let path = root.join(dir);
            std::fs::create_dir_all(&path).map_err(|e| ProblemError::io(&path, e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn input_path(&self, ordinal: usize) -> PathBuf {
        self.root
            .join(INPUT_DIR)
            .join(format!("sample-{}.in", ordinal))
    }

    pub fn expected_path(&self, ordinal: usize) -> PathBuf {
        self.root
            .join(OUTPUT_DIR)
            .join(format!("sample-{}.out", ordinal))
    }

    /// All cases in ascending ordinal order
    pub fn cases(&self) -> Result<Vec<SampleCase>> {
        let mut cases = Vec::new();
        for ordinal in 0.. {
            let input = self.input_path(ordinal);
            if !input.is_file() {
                break;
            }
            let expected = self.expected_path(ordinal);
            if !expected.is_file() {
                return Err(ProblemError::InvalidSample { ordinal, expected });
            }
            cases.push(SampleCase {
                ordinal,
                input,
                expected,
            });
        }
        debug!("Found {} samples in {}", cases.len(), self.root.display());
        Ok(cases)
    }

    /// Append a case at the next free ordinal
    pub fn add_case(&self, input: &str, expected: &str) -> Result<SampleCase> {
        let ordinal = self.cases()?.len();
        let case = SampleCase {
            ordinal,
            input: self.input_path(ordinal),
            expected: self.expected_path(ordinal),
        };
        for (path, content) in [(&case.input, input), (&case.expected, expected)] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| ProblemError::io(parent, e))?;
            }
            std::fs::write(path, content).map_err(|e| ProblemError::io(path, e))?;
        }
        info!("Added {} to {}", case.name(), self.root.display());
        Ok(case)
    }
}
