//! Deckgen: Deck Asset Registry
//!
//! Maintains the card game's registry of creature nouns and modifier
//! adjectives, each with a level, plus the avatar images attached to nouns.
//! The registry is a JSON file saved with timestamped, retention-bounded
//! backups; avatars are reconciled against the avatar directory and topped up
//! through a pluggable image generator.

pub mod avatar;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod provider;
pub mod store;
pub mod tooling;
pub mod types;
