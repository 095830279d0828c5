//! Registry Store
//!
//! In-memory model of the deck generator registry: creature nouns with their
//! avatar resources, and adjectives, each tagged with a difficulty level.

pub mod backup;
pub mod persistence;
pub mod table;

pub use backup::{BackupManager, BackupOutcome, BackupRecord};
pub use persistence::{RegistryStore, SaveOptions, SaveOutcome};
pub use table::EntryTable;

use crate::types::{EntryKind, Level, ResourceRef};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Creature descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NounEntry {
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Level,
    #[serde(default, deserialize_with = "deserialize_avatars")]
    pub avatars: Vec<ResourceRef>,
}

impl NounEntry {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            avatars: Vec::new(),
        }
    }

    /// Append an avatar reference unless it is already listed.
    pub fn add_avatar(&mut self, resource: ResourceRef) -> bool {
        if self.avatars.contains(&resource) {
            return false;
        }
        self.avatars.push(resource);
        true
    }

    /// Drop repeated avatar references, keeping first occurrences.
    ///
    /// Returns the number of references removed.
    pub fn dedup_avatars(&mut self) -> usize {
        let before = self.avatars.len();
        let mut seen = HashSet::new();
        self.avatars.retain(|r| seen.insert(r.clone()));
        before - self.avatars.len()
    }
}

/// Modifier descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjEntry {
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Level,
}

impl AdjEntry {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

/// Root persisted object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub nouns: EntryTable<NounEntry>,
    pub adjectives: EntryTable<AdjEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check key constraints that the JSON schema alone cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.nouns.keys().any(|k| k.is_empty()) {
            return Err("noun names must be non-empty".to_string());
        }
        if self.adjectives.keys().any(|k| k.is_empty()) {
            return Err("adjective names must be non-empty".to_string());
        }
        Ok(())
    }

    /// Collapse duplicate avatar references in every noun.
    pub fn dedup_avatars(&mut self) -> usize {
        self.nouns
            .iter_mut()
            .map(|(_, entry)| entry.dedup_avatars())
            .sum()
    }

    /// Reorder both tables into canonical `(level, key)` order.
    pub fn sort_canonical(&mut self) {
        self.nouns.sort_by_rank(|e| e.level);
        self.adjectives.sort_by_rank(|e| e.level);
    }

    /// Canonically ordered copy of this registry.
    pub fn sorted(&self) -> Registry {
        let mut sorted = self.clone();
        sorted.sort_canonical();
        sorted
    }

    pub fn contains(&self, kind: EntryKind, key: &str) -> bool {
        match kind {
            EntryKind::Noun => self.nouns.contains_key(key),
            EntryKind::Adjective => self.adjectives.contains_key(key),
        }
    }

    pub fn level_of(&self, kind: EntryKind, key: &str) -> Option<Level> {
        match kind {
            EntryKind::Noun => self.nouns.get(key).map(|e| e.level),
            EntryKind::Adjective => self.adjectives.get(key).map(|e| e.level),
        }
    }

    /// Entry names grouped by level, levels ascending, names in table order.
    pub fn names_by_level(&self, kind: EntryKind) -> BTreeMap<Level, Vec<String>> {
        let mut grouped: BTreeMap<Level, Vec<String>> = BTreeMap::new();
        let pairs: Vec<(&str, Level)> = match kind {
            EntryKind::Noun => self.nouns.iter().map(|(k, e)| (k, e.level)).collect(),
            EntryKind::Adjective => self.adjectives.iter().map(|(k, e)| (k, e.level)).collect(),
        };
        for (name, level) in pairs {
            grouped.entry(level).or_default().push(name.to_string());
        }
        grouped
    }

    pub fn avatar_count(&self) -> usize {
        self.nouns.iter().map(|(_, e)| e.avatars.len()).sum()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevel {
    Int(u64),
    Text(String),
}

/// Levels are non-negative integers; numeric strings are coerced.
fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Level, D::Error> {
    use serde::de::Error;
    let raw = RawLevel::deserialize(deserializer)
        .map_err(|_| D::Error::custom("level must be a non-negative integer"))?;
    let value = match raw {
        RawLevel::Int(v) => v,
        RawLevel::Text(s) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| D::Error::custom(format!("level is not a non-negative integer: {s:?}")))?,
    };
    Level::try_from(value).map_err(|_| D::Error::custom(format!("level out of range: {value}")))
}

/// `"avatars": null` is treated as an empty list.
fn deserialize_avatars<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ResourceRef>, D::Error> {
    Ok(Option::<Vec<ResourceRef>>::deserialize(deserializer)?.unwrap_or_default())
}
