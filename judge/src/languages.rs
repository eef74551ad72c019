//! Submission language table
//!
//! Maps the contest site's numeric language ids to display names, with
//! short aliases for lookup. Built once in `main` and passed to whoever
//! needs it.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use serde::Deserialize;

/// One submission language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    /// Key in the configuration (e.g. "python")
    pub key: String,
    pub id: u32,
    pub name: String,
}

/// Raw TOML configuration for a language
#[derive(Debug, Deserialize)]
struct RawLanguageConfig {
    id: u32,
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    by_id: BTreeMap<u32, Language>,
    /// Lowercased key or alias -> id
    names: HashMap<String, u32>,
}

impl LanguageTable {
    /// Table compiled into the binary
    pub fn builtin() -> anyhow::Result<Self> {
        let content = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/files/languages.toml"));
        Self::from_toml_str(content).context("Invalid built-in language table")
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let raw_configs: HashMap<String, RawLanguageConfig> = toml::from_str(content)?;

        let mut table = LanguageTable::default();
        for (key, raw) in raw_configs {
            if let Some(existing) = table.by_id.get(&raw.id) {
                anyhow::bail!(
                    "Language id {} used by both {} and {}",
                    raw.id,
                    existing.key,
                    key
                );
            }

            table.names.insert(key.to_lowercase(), raw.id);
            for alias in raw.aliases {
                table.names.insert(alias.to_lowercase(), raw.id);
            }
            table.by_id.insert(
                raw.id,
                Language {
                    key,
                    id: raw.id,
                    name: raw.name,
                },
            );
        }

        Ok(table)
    }

    pub fn get(&self, id: u32) -> Option<&Language> {
        self.by_id.get(&id)
    }

    /// Look up by id ("5055"), key or alias ("py")
    pub fn find(&self, query: &str) -> Option<&Language> {
        if let Ok(id) = query.parse::<u32>() {
            return self.get(id);
        }
        let id = self.names.get(&query.to_lowercase())?;
        self.by_id.get(id)
    }

    /// Display name for an id, "Unknown" if not configured
    pub fn name_of(&self, id: u32) -> &str {
        self.get(id).map(|l| l.name.as_str()).unwrap_or("Unknown")
    }

    /// All languages ordered by id
    pub fn iter(&self) -> impl Iterator<Item = &Language> {
        self.by_id.values()
    }
}
