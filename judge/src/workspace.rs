//! Workspace discovery and the `.acp/cache.json` file
//!
//! A workspace is any directory holding the marker directory (`.acp` by
//! default). Its cache records which contest was joined last and where that
//! contest was downloaded, so commands run anywhere below the workspace can
//! find the problem index without `-d`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::utils::find_upwards;
use crate::error::ProblemError;
use crate::index::ContestRef;

pub const CACHE_FILE: &str = "cache.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceCache {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contest: Option<ContestRef>,
    /// Contest directory, relative to the workspace root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    cache_dir: PathBuf,
}

impl Workspace {
    /// Search `start` and its ancestors for the marker directory
    pub fn locate(start: &Path, marker: &str) -> Option<Self> {
        let cache_dir = find_upwards(start, marker)?;
        let root = cache_dir.parent()?.to_path_buf();
        debug!("Found workspace at {}", root.display());
        Some(Self { root, cache_dir })
    }

    /// Create the marker directory under `root`
    pub fn init(root: &Path, marker: &str) -> Result<Self> {
        let cache_dir = root.join(marker);
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create {}", cache_dir.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
            cache_dir,
        })
    }

    /// Workspace around `dir` (taken relative to `cwd`), created at `dir`
    /// when there is none
    pub fn locate_or_init(cwd: &Path, dir: &Path, marker: &str) -> Result<Self> {
        let dir = cwd.join(dir);
        match Self::locate(&dir, marker) {
            Some(workspace) => Ok(workspace),
            None => Self::init(&dir, marker),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_path(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    pub fn read_cache(&self) -> Result<WorkspaceCache> {
        let path = self.cache_path();
        if !path.exists() {
            return Ok(WorkspaceCache::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Invalid cache {}", path.display()))
    }

    /// Merge `update` into the cache file, keeping keys it does not set
    pub fn write_cache(&self, update: &WorkspaceCache) -> Result<()> {
        let path = self.cache_path();
        let mut merged = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&content)
                .with_context(|| format!("Invalid cache {}", path.display()))?
        } else {
            serde_json::Map::new()
        };

        if let serde_json::Value::Object(fields) = serde_json::to_value(update)? {
            merged.extend(fields);
        }

        std::fs::write(&path, serde_json::to_string_pretty(&merged)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Updated workspace cache {}", path.display());
        Ok(())
    }

    /// Record `contest_dir` as the joined contest
    pub fn record_contest(&self, contest: ContestRef, contest_dir: &Path) -> Result<()> {
        let target_dir = contest_dir
            .strip_prefix(&self.root)
            .unwrap_or(contest_dir)
            .to_string_lossy()
            .to_string();
        self.write_cache(&WorkspaceCache {
            contest: Some(contest),
            target_dir: Some(target_dir),
        })
    }

    /// Directory of the joined contest, if one was recorded
    pub fn contest_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self
            .read_cache()?
            .target_dir
            .map(|dir| self.root.join(dir)))
    }
}

/// Contest directory for a command: `explicit` if given, else the one
/// recorded in the workspace around `cwd`
pub fn resolve_contest_dir(explicit: Option<&Path>, cwd: &Path, marker: &str) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => Workspace::locate(cwd, marker)
            .map(|ws| ws.contest_dir())
            .transpose()?
            .flatten()
            .ok_or_else(|| {
                ProblemError::not_found(format!(
                    "No contest recorded in a workspace around {}; pass --directory",
                    cwd.display()
                ))
            })?,
    };

    if !dir.is_dir() {
        return Err(ProblemError::not_found(format!(
            "Failed to find problems in {}",
            dir.display()
        ))
        .into());
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contest() -> ContestRef {
        ContestRef {
            name: "abc100".into(),
            url: "https://atcoder.jp/contests/abc100".into(),
        }
    }

    #[test]
    fn test_record_and_locate_from_subdir() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::init(root.path(), ".acp").unwrap();
        let contest_dir = root.path().join("contests").join("abc100");
        std::fs::create_dir_all(contest_dir.join("00-abc100_a")).unwrap();
        ws.record_contest(contest(), &contest_dir).unwrap();

        let found = Workspace::locate(&contest_dir.join("00-abc100_a"), ".acp").unwrap();
        assert_eq!(found.root(), root.path());
        let cache = found.read_cache().unwrap();
        assert_eq!(cache.contest, Some(contest()));
        assert_eq!(cache.target_dir.as_deref(), Some("contests/abc100"));
        assert_eq!(found.contest_dir().unwrap(), Some(contest_dir.clone()));

        let resolved =
            resolve_contest_dir(None, &contest_dir.join("00-abc100_a"), ".acp").unwrap();
        assert_eq!(resolved, contest_dir);
    }

    #[test]
    fn test_write_cache_merges() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::init(root.path(), ".acp").unwrap();
        std::fs::write(
            root.path().join(".acp").join(CACHE_FILE),
            r#"{"target_dir": "old", "extra": 1}"#,
        )
        .unwrap();

        ws.write_cache(&WorkspaceCache {
            contest: Some(contest()),
            target_dir: None,
        })
        .unwrap();

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(root.path().join(".acp").join(CACHE_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["extra"], 1);
        assert_eq!(raw["target_dir"], "old");
        assert_eq!(raw["contest"]["name"], "abc100");
    }

    #[test]
    fn test_relative_dir_finds_workspace_above_cwd() {
        let root = tempfile::tempdir().unwrap();
        Workspace::init(root.path(), ".acp").unwrap();
        let cwd = root.path().join("contests");
        std::fs::create_dir_all(cwd.join("abc")).unwrap();

        let ws = Workspace::locate_or_init(&cwd, Path::new("abc"), ".acp").unwrap();
        assert_eq!(ws.root(), root.path());
        assert!(!cwd.join("abc").join(".acp").exists());

        let fresh = tempfile::tempdir().unwrap();
        let ws = Workspace::locate_or_init(fresh.path(), Path::new("new"), ".acp").unwrap();
        assert_eq!(ws.root(), fresh.path().join("new"));
        assert!(fresh.path().join("new").join(".acp").is_dir());
    }

    #[test]
    fn test_empty_cache() {
        let root = tempfile::tempdir().unwrap();
        let ws = Workspace::init(root.path(), ".acp").unwrap();
        assert_eq!(ws.read_cache().unwrap(), WorkspaceCache::default());
        assert_eq!(ws.contest_dir().unwrap(), None);
    }

    #[test]
    fn test_explicit_dir_must_exist() {
        let root = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_contest_dir(Some(root.path()), Path::new("/"), ".acp").unwrap(),
            root.path()
        );

        let err = resolve_contest_dir(Some(&root.path().join("nope")), Path::new("/"), ".acp")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ProblemError>(),
            Some(ProblemError::ProblemsNotFound(_))
        ));
    }
}
