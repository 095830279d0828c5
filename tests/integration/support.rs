//! Scripted collaborators shared by the integration tests.

use async_trait::async_trait;
use deckgen::avatar::layout::{create_next_free, creature_slug};
use deckgen::avatar::AvatarLayout;
use deckgen::error::ApiError;
use deckgen::provider::{AvatarGenerator, AvatarPostProcessor, PromptContext, RawImage};
use deckgen::types::ResourceRef;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Generator that hands back placeholder raw images and records every request.
pub struct RecordingGenerator {
    raw_dir: PathBuf,
    calls: Mutex<Vec<(String, usize)>>,
    /// Per creature: requests to let through first, then errors to return.
    failures: Mutex<HashMap<String, (usize, Vec<ApiError>)>>,
    batch_limit: Option<usize>,
    short_by: usize,
}

impl RecordingGenerator {
    pub fn new(raw_dir: &Path) -> Self {
        Self {
            raw_dir: raw_dir.to_path_buf(),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            batch_limit: None,
            short_by: 0,
        }
    }

    /// Queue errors returned (in order) for the next requests about `creature`.
    pub fn fail_with(self, creature: &str, errors: Vec<ApiError>) -> Self {
        self.fail_after(creature, 0, errors)
    }

    /// Like `fail_with`, but only after `successes` requests have succeeded.
    pub fn fail_after(self, creature: &str, successes: usize, errors: Vec<ApiError>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(creature.to_string(), (successes, errors));
        self
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = Some(limit);
        self
    }

    /// Return this many fewer images than requested.
    pub fn short_by(mut self, missing: usize) -> Self {
        self.short_by = missing;
        self
    }

    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn counts_for(&self, creature: &str) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter(|(c, _)| c == creature)
            .map(|(_, n)| n)
            .collect()
    }
}

#[async_trait]
impl AvatarGenerator for RecordingGenerator {
    async fn generate(
        &self,
        prompt: &PromptContext,
        count: usize,
    ) -> Result<Vec<RawImage>, ApiError> {
        let previous = self.calls().iter().filter(|(c, _)| c == &prompt.creature).count();
        self.calls
            .lock()
            .unwrap()
            .push((prompt.creature.clone(), count));

        if let Some((successes, queue)) = self.failures.lock().unwrap().get_mut(&prompt.creature) {
            if *successes > 0 {
                *successes -= 1;
            } else if !queue.is_empty() {
                return Err(queue.remove(0));
            }
        }

        Ok((0..count.saturating_sub(self.short_by))
            .map(|i| RawImage {
                path: self
                    .raw_dir
                    .join(format!("{}_{}_{}.png", prompt.creature, previous, i)),
            })
            .collect())
    }

    fn batch_limit(&self) -> Option<usize> {
        self.batch_limit
    }
}

/// Generator that writes a solid-colour PNG per image into the raw directory,
/// taking the first free `<slug>_<n>.png` like the shipped client does.
pub struct SolidPngGenerator {
    raw_dir: PathBuf,
    color: [u8; 3],
}

impl SolidPngGenerator {
    pub fn new(raw_dir: &Path, color: [u8; 3]) -> Self {
        Self {
            raw_dir: raw_dir.to_path_buf(),
            color,
        }
    }
}

#[async_trait]
impl AvatarGenerator for SolidPngGenerator {
    async fn generate(
        &self,
        prompt: &PromptContext,
        count: usize,
    ) -> Result<Vec<RawImage>, ApiError> {
        let slug = creature_slug(&prompt.creature);
        let mut images = Vec::new();
        for _ in 0..count {
            let (path, file) = create_next_free(&self.raw_dir, &slug, "png")?;
            drop(file);
            image::RgbImage::from_pixel(32, 32, image::Rgb(self.color))
                .save(&path)
                .unwrap();
            images.push(RawImage { path });
        }
        Ok(images)
    }
}

/// Post-processor that drops an empty file per raw image into the avatar dir.
pub struct TouchFormatter {
    layout: AvatarLayout,
}

impl TouchFormatter {
    pub fn new(layout: AvatarLayout) -> Self {
        Self { layout }
    }
}

impl AvatarPostProcessor for TouchFormatter {
    fn format(&self, raw: &RawImage) -> Result<ResourceRef, ApiError> {
        let name = format!(
            "avatar_{}",
            raw.path.file_name().unwrap().to_string_lossy()
        );
        std::fs::create_dir_all(&self.layout.avatar_dir).unwrap();
        std::fs::write(self.layout.avatar_dir.join(&name), b"png").unwrap();
        Ok(self.layout.reference_for(&name))
    }
}

pub fn layout_in(root: &Path) -> AvatarLayout {
    let avatar_dir = root.join("avatars");
    let raw_dir = avatar_dir.join("raw");
    std::fs::create_dir_all(&raw_dir).unwrap();
    AvatarLayout::new(avatar_dir, raw_dir, "res://assets/sprites/avatars")
}
