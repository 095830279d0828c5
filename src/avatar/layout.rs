//! Mapping between avatar resource references and files on disk.

use crate::error::{ApiError, StorageError};
use crate::types::ResourceRef;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// An avatar image present in the avatar directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    pub path: PathBuf,
    pub reference: ResourceRef,
}

/// Where finished avatars and raw generations live, and how finished avatars
/// are referenced from the registry.
///
/// A reference is `<resource_prefix>/<file name>` and resolves to
/// `<avatar_dir>/<file name>`.
#[derive(Debug, Clone)]
pub struct AvatarLayout {
    pub avatar_dir: PathBuf,
    pub raw_dir: PathBuf,
    resource_prefix: String,
}

impl AvatarLayout {
    pub fn new(
        avatar_dir: impl Into<PathBuf>,
        raw_dir: impl Into<PathBuf>,
        resource_prefix: impl Into<String>,
    ) -> Self {
        let prefix: String = resource_prefix.into();
        Self {
            avatar_dir: avatar_dir.into(),
            raw_dir: raw_dir.into(),
            resource_prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn resource_prefix(&self) -> &str {
        &self.resource_prefix
    }

    pub fn reference_for(&self, file_name: &str) -> ResourceRef {
        format!("{}/{}", self.resource_prefix, file_name)
    }

    /// File name a reference points at, if it is under this layout's prefix.
    pub fn file_name_of<'a>(&self, reference: &'a str) -> Option<&'a str> {
        let name = reference
            .strip_prefix(self.resource_prefix.as_str())?
            .strip_prefix('/')?;
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return None;
        }
        Some(name)
    }

    pub fn path_of(&self, reference: &str) -> Option<PathBuf> {
        self.file_name_of(reference)
            .map(|name| self.avatar_dir.join(name))
    }

    /// Avatar images directly inside the avatar directory, sorted by file name.
    ///
    /// Subdirectories (the raw generation directory among them) are not scanned.
    /// A directory that does not exist yet holds no avatars.
    pub fn list_avatar_files(&self) -> Result<Vec<AvatarFile>, ApiError> {
        let entries = match fs::read_dir(&self.avatar_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(dir = %self.avatar_dir.display(), "Avatar directory absent");
                return Ok(Vec::new());
            }
            Err(e) => return Err(StorageError::at(&self.avatar_dir, e).into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::at(&self.avatar_dir, e))?;
            let path = entry.path();
            if !path.is_file() || !is_image(&path) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!("Skipping non UTF8 avatar filename: {:?}", path);
                continue;
            };
            files.push(AvatarFile {
                reference: self.reference_for(name),
                path: path.clone(),
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Create the first `<dir>/<stem>_<n>.<ext>` that does not exist yet.
///
/// The file is opened with `create_new`, so an existing file is never reused
/// even if it appears between the scan and the create.
pub fn create_next_free(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File), ApiError> {
    let mut n = 0usize;
    loop {
        let candidate = dir.join(format!("{}_{}.{}", stem, n, ext));
        if let Some(file) = create_exclusive(&candidate)? {
            return Ok((candidate, file));
        }
        n += 1;
    }
}

/// Open `path` for writing only if nothing exists there; `None` when taken.
pub fn create_exclusive(path: &Path) -> Result<Option<File>, ApiError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(StorageError::at(path, e).into()),
    }
}

/// File-name form of a creature name: lowercase, spaces to underscores.
pub fn creature_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(char::is_whitespace, "_")
}
