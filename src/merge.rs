//! Entry Merger
//!
//! Add-or-update of nouns and adjectives. Existing entries are only touched
//! when overwriting is requested, and then only their level changes.

use crate::store::{AdjEntry, NounEntry, Registry};
use crate::types::{EntryKind, Level};
use serde::Serialize;
use tracing::{debug, warn};

/// What happened to one input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    Added,
    /// Existing entry had its level overwritten.
    Updated { previous_level: Level },
    /// Existing entry left alone because overwriting was not requested.
    SkippedExists { existing_level: Level },
    /// Empty after trimming.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeLine {
    pub value: String,
    pub outcome: MergeOutcome,
}

/// One line per input value, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub kind: EntryKind,
    pub level: Level,
    pub lines: Vec<MergeLine>,
}

impl MergeReport {
    fn count(&self, pred: impl Fn(&MergeOutcome) -> bool) -> usize {
        self.lines.iter().filter(|l| pred(&l.outcome)).count()
    }

    pub fn added(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Added))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::SkippedExists { .. }))
    }

    pub fn invalid(&self) -> usize {
        self.count(|o| matches!(o, MergeOutcome::Invalid))
    }

    /// Whether the registry was changed and needs saving.
    pub fn changed(&self) -> bool {
        self.added() + self.updated() > 0
    }
}

/// Add `values` to the `kind` table at `level`.
pub fn add_entries<S: AsRef<str>>(
    registry: &mut Registry,
    kind: EntryKind,
    values: &[S],
    level: Level,
    overwrite: bool,
) -> MergeReport {
    let mut lines = Vec::with_capacity(values.len());
    for raw in values {
        let value = raw.as_ref().trim();
        let outcome = if value.is_empty() {
            MergeOutcome::Invalid
        } else {
            merge_one(registry, kind, value, level, overwrite)
        };
        match outcome {
            MergeOutcome::SkippedExists { existing_level } => warn!(
                kind = %kind,
                value,
                existing_level,
                "Entry already exists, skipping"
            ),
            MergeOutcome::Invalid => warn!(kind = %kind, "Ignoring empty entry name"),
            _ => debug!(kind = %kind, value, outcome = ?outcome, "Merged entry"),
        }
        lines.push(MergeLine {
            value: value.to_string(),
            outcome,
        });
    }
    MergeReport { kind, level, lines }
}

fn merge_one(
    registry: &mut Registry,
    kind: EntryKind,
    value: &str,
    level: Level,
    overwrite: bool,
) -> MergeOutcome {
    let existing = match kind {
        EntryKind::Noun => registry.nouns.get_mut(value).map(|e| &mut e.level),
        EntryKind::Adjective => registry.adjectives.get_mut(value).map(|e| &mut e.level),
    };
    match existing {
        Some(current) if overwrite => {
            let previous_level = *current;
            *current = level;
            MergeOutcome::Updated { previous_level }
        }
        Some(current) => MergeOutcome::SkippedExists {
            existing_level: *current,
        },
        None => {
            match kind {
                EntryKind::Noun => {
                    registry
                        .nouns
                        .insert(value.to_string(), NounEntry::new(level));
                }
                EntryKind::Adjective => {
                    registry
                        .adjectives
                        .insert(value.to_string(), AdjEntry::new(level));
                }
            }
            MergeOutcome::Added
        }
    }
}
