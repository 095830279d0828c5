//! Core types for the deck asset registry.

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty level of a noun or adjective.
pub type Level = u32;

/// Logical avatar resource reference, e.g. `res://assets/sprites/avatars/avatar_fox_0.png`.
pub type ResourceRef = String;

/// Which registry table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Noun,
    Adjective,
}

impl EntryKind {
    /// Parse the kind accepted on the command line: `noun`, `adj`, or `adjective`.
    pub fn parse(kind: &str) -> Result<Self, ApiError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "noun" | "nouns" => Ok(EntryKind::Noun),
            "adj" | "adjective" | "adjectives" => Ok(EntryKind::Adjective),
            other => Err(ApiError::ConfigError(format!(
                "Invalid entry kind: {}. Must be noun, adj, or adjective",
                other
            ))),
        }
    }

    /// Name of the table in the persisted registry.
    pub fn table_name(self) -> &'static str {
        match self {
            EntryKind::Noun => "nouns",
            EntryKind::Adjective => "adjectives",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Noun => write!(f, "noun"),
            EntryKind::Adjective => write!(f, "adjective"),
        }
    }
}
