//! Insertion-ordered entry table.
//!
//! JSON object key order is part of the persisted registry format: unsorted saves
//! keep the order entries were loaded or added in, sorted saves emit the canonical
//! `(level, key)` order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryTable<E> {
    entries: IndexMap<String, E>,
}

impl<E> Default for EntryTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EntryTable<E> {
    pub fn new() -> Self {
        EntryTable {
            entries: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut E> {
        self.entries.get_mut(key)
    }

    /// Insert or replace an entry.
    ///
    /// A replaced entry keeps its position; a new entry is appended.
    pub fn insert(&mut self, key: String, value: E) -> Option<E> {
        self.entries.insert(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &E)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut E)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Reorder entries ascending by `(rank(entry), key)`.
    pub fn sort_by_rank<R: Ord>(&mut self, rank: impl Fn(&E) -> R) {
        self.entries
            .sort_by(|ka, a, kb, b| rank(a).cmp(&rank(b)).then_with(|| ka.cmp(kb)));
    }
}

/// Equality is by content and order, matching what ends up on disk.
impl<E: PartialEq> PartialEq for EntryTable<E> {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl<E: Eq> Eq for EntryTable<E> {}

impl<E> FromIterator<(String, E)> for EntryTable<E> {
    fn from_iter<I: IntoIterator<Item = (String, E)>>(iter: I) -> Self {
        let mut table = EntryTable::new();
        for (key, value) in iter {
            table.insert(key, value);
        }
        table
    }
}
