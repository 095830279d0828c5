//! Avatar top-up: bring a noun's avatar list up to a target count.

use crate::error::ApiError;
use crate::provider::{
    AvatarGenerator, AvatarPostProcessor, PromptContext, PromptTemplate, RawImage, RetryPolicy,
};
use crate::store::Registry;
use crate::types::{EntryKind, ResourceRef};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Collaborators used to produce new avatars.
pub struct AvatarPipeline<'a> {
    pub generator: &'a dyn AvatarGenerator,
    pub post_processor: &'a dyn AvatarPostProcessor,
    pub prompts: &'a PromptTemplate,
    pub retry: RetryPolicy,
}

/// Generate avatars for `noun` until it has at least `target` of them.
///
/// Returns the references appended, in generation order. A target at or below
/// the current count generates nothing. Either exactly the deficit is appended
/// or the entry is left unchanged and an error is returned.
pub async fn ensure_avatar_count(
    registry: &mut Registry,
    noun: &str,
    target: usize,
    pipeline: &AvatarPipeline<'_>,
) -> Result<Vec<ResourceRef>, ApiError> {
    let current = registry
        .nouns
        .get(noun)
        .ok_or_else(|| ApiError::UnknownEntry {
            kind: EntryKind::Noun.to_string(),
            key: noun.to_string(),
        })?
        .avatars
        .len();

    if target <= current {
        debug!(noun, current, target, "Avatar count already satisfied");
        return Ok(Vec::new());
    }
    let deficit = target - current;

    let prompt = pipeline.prompts.render(noun);
    let raw_images = request_raw_images(noun, &prompt, deficit, pipeline).await?;

    // Format everything before touching the registry so a failure leaves it unchanged.
    let mut references = Vec::with_capacity(raw_images.len());
    for raw in &raw_images {
        references.push(pipeline.post_processor.format(raw)?);
    }

    let entry = registry
        .nouns
        .get_mut(noun)
        .ok_or_else(|| ApiError::UnknownEntry {
            kind: EntryKind::Noun.to_string(),
            key: noun.to_string(),
        })?;
    let mut seen: HashSet<&str> = entry.avatars.iter().map(String::as_str).collect();
    if let Some(repeat) = references.iter().find(|r| !seen.insert(r.as_str())) {
        return Err(ApiError::GenerationFailed(format!(
            "Post-processor produced {} which {} already references",
            repeat, noun
        )));
    }

    let appended = references;
    for reference in &appended {
        entry.add_avatar(reference.clone());
    }

    info!(noun, generated = appended.len(), total = entry.avatars.len(), "Topped up avatars");
    Ok(appended)
}

/// Ask the generator for exactly `count` raw images.
///
/// Requests are split at the generator's batch limit and each one is retried
/// on its own, so images from batches that already succeeded are kept.
async fn request_raw_images(
    noun: &str,
    prompt: &PromptContext,
    count: usize,
    pipeline: &AvatarPipeline<'_>,
) -> Result<Vec<RawImage>, ApiError> {
    let limit = pipeline.generator.batch_limit().unwrap_or(count).max(1);
    let mut raw_images = Vec::with_capacity(count);
    while raw_images.len() < count {
        let n = (count - raw_images.len()).min(limit);
        let label = format!("generate {} avatars for {}", n, noun);
        let mut batch = pipeline
            .retry
            .run(&label, |_| pipeline.generator.generate(prompt, n))
            .await?;
        if batch.len() < n {
            return Err(ApiError::GenerationFailed(format!(
                "Generator returned {} of {} requested images for {}",
                batch.len(),
                n,
                noun
            )));
        }
        if batch.len() > n {
            warn!(
                noun,
                requested = n,
                received = batch.len(),
                "Generator returned more images than requested, dropping extras"
            );
            batch.truncate(n);
        }
        raw_images.extend(batch);
    }
    Ok(raw_images)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopUpLine {
    pub noun: String,
    pub generated: Vec<ResourceRef>,
}

/// Outcome of a top-up run over one or all nouns.
#[derive(Debug, Default, Serialize)]
pub struct TopUpReport {
    pub lines: Vec<TopUpLine>,
    /// Requested creatures not in the registry.
    pub unknown: Vec<String>,
    /// Noun whose generation failed fatally; later nouns were not attempted.
    #[serde(skip)]
    pub failure: Option<(String, ApiError)>,
}

impl TopUpReport {
    pub fn generated(&self) -> usize {
        self.lines.iter().map(|l| l.generated.len()).sum()
    }
}

/// Top up `creatures` (or every noun, in table order, when empty).
///
/// Unknown creatures are reported and skipped. The first fatal generation
/// failure stops the run; everything appended before it stays in `registry`.
pub async fn top_up(
    registry: &mut Registry,
    creatures: &[String],
    target: usize,
    pipeline: &AvatarPipeline<'_>,
) -> TopUpReport {
    let nouns: Vec<String> = if creatures.is_empty() {
        registry.nouns.keys().map(str::to_string).collect()
    } else {
        creatures.to_vec()
    };

    let mut report = TopUpReport::default();
    for noun in nouns {
        match ensure_avatar_count(registry, &noun, target, pipeline).await {
            Ok(generated) => report.lines.push(TopUpLine { noun, generated }),
            Err(ApiError::UnknownEntry { .. }) => {
                warn!(noun = %noun, "Unknown creature, skipping");
                report.unknown.push(noun);
            }
            Err(e) => {
                report.failure = Some((noun, e));
                break;
            }
        }
    }
    report
}
