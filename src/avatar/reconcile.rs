//! Reconciliation between registry avatar references and the avatar directory.
//!
//! Dangling references (no file) are removed from the registry. Orphan files
//! (no reference) are reported only; deleting them is left to the user.

use crate::avatar::layout::{AvatarFile, AvatarLayout};
use crate::error::ApiError;
use crate::store::Registry;
use crate::types::ResourceRef;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingRef {
    pub noun: String,
    pub reference: ResourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanFile {
    pub path: PathBuf,
    pub reference: ResourceRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub removed: Vec<DanglingRef>,
    pub orphans: Vec<OrphanFile>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.orphans.is_empty()
    }
}

/// Remove every avatar reference not in `present`.
///
/// Removed references are returned in noun order, then list order.
pub fn remove_dangling(registry: &mut Registry, present: &HashSet<ResourceRef>) -> Vec<DanglingRef> {
    let mut removed = Vec::new();
    for (noun, entry) in registry.nouns.iter_mut() {
        entry.avatars.retain(|reference| {
            if present.contains(reference) {
                return true;
            }
            warn!(noun, reference = %reference, "Removing dangling avatar reference");
            removed.push(DanglingRef {
                noun: noun.to_string(),
                reference: reference.clone(),
            });
            false
        });
    }
    removed
}

/// Files whose reference is not reachable from any noun.
pub fn find_orphans(registry: &Registry, files: &[AvatarFile]) -> Vec<OrphanFile> {
    let referenced: HashSet<&str> = registry
        .nouns
        .iter()
        .flat_map(|(_, entry)| entry.avatars.iter().map(String::as_str))
        .collect();

    files
        .iter()
        .filter(|file| !referenced.contains(file.reference.as_str()))
        .map(|file| {
            warn!(path = %file.path.display(), "Avatar file is not referenced by any noun");
            OrphanFile {
                path: file.path.clone(),
                reference: file.reference.clone(),
            }
        })
        .collect()
}

/// Scan the avatar directory once, drop dangling references, report orphans.
///
/// Mutates `registry` in memory only; persisting it is the caller's job.
pub fn reconcile(registry: &mut Registry, layout: &AvatarLayout) -> Result<ReconcileReport, ApiError> {
    let files = layout.list_avatar_files()?;
    let present: HashSet<ResourceRef> = files.iter().map(|f| f.reference.clone()).collect();

    let removed = remove_dangling(registry, &present);
    let orphans = find_orphans(registry, &files);

    info!(
        avatar_files = files.len(),
        removed = removed.len(),
        orphans = orphans.len(),
        "Reconciled avatar references"
    );
    Ok(ReconcileReport { removed, orphans })
}
