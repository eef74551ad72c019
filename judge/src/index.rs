//! Problem index (`info.json`)
//!
//! One JSON object per contest download, mapping problem name to its
//! metadata. The order of the object's keys is significant: the position of
//! an entry is itself a lookup key, so the index keeps insertion order through
//! load and save.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ProblemError, Result};

pub const INDEX_FILE: &str = "info.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub contest: ContestRef,
    pub name: String,
    #[serde(default)]
    pub title: String,
    pub url: String,
    /// Problem directory, relative to the directory holding the index
    pub root_dir: String,
    /// Problem letter within the contest ("A", "B", ...)
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub point: u32,
    #[serde(default)]
    pub is_interactive: bool,
}

impl IndexEntry {
    /// Absolute problem directory for an index stored in `contest_dir`
    pub fn root_path(&self, contest_dir: &Path) -> PathBuf {
        contest_dir.join(&self.root_dir)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemIndex {
    entries: Vec<(String, IndexEntry)>,
}

impl ProblemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the index file of a contest directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ProblemError::not_found(format!(
                "Failed to find problems in {}",
                path.parent().unwrap_or(path).display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ProblemError::io(path, e))?;
        let index: ProblemIndex =
            serde_json::from_str(&content).map_err(|source| ProblemError::MalformedIndex {
                path: path.to_path_buf(),
                source,
            })?;
        debug!("Loaded {} problems from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            ProblemError::MalformedIndex {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json).map_err(|e| ProblemError::io(path, e))?;
        info!("Wrote {} problems to {}", self.len(), path.display());
        Ok(())
    }

    /// Insert under the entry's name; an existing entry keeps its position
    pub fn insert(&mut self, entry: IndexEntry) {
        let key = entry.name.clone();
        self.insert_keyed(key, entry);
    }

    fn insert_keyed(&mut self, key: String, entry: IndexEntry) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = entry,
            None => self.entries.push((key, entry)),
        }
    }

    /// Entry stored under `name`, with its position
    pub fn get(&self, name: &str) -> Option<(usize, &IndexEntry)> {
        self.entries
            .iter()
            .position(|(k, _)| k == name)
            .map(|position| (position, &self.entries[position].1))
    }

    /// Entry by insertion position
    pub fn get_index(&self, position: usize) -> Option<&IndexEntry> {
        self.entries.get(position).map(|(_, entry)| entry)
    }

    /// `(position, entry)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &IndexEntry)> {
        self.entries.iter().map(|(_, entry)| entry).enumerate()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ProblemIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ProblemIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct IndexVisitor;

        impl<'de> Visitor<'de> for IndexVisitor {
            type Value = ProblemIndex;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of problem name to problem metadata")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut index = ProblemIndex::new();
                while let Some((key, entry)) = access.next_entry::<String, IndexEntry>()? {
                    index.insert_keyed(key, entry);
                }
                Ok(index)
            }
        }

        deserializer.deserialize_map(IndexVisitor)
    }
}
