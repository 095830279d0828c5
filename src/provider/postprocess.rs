//! Pixel-art avatar formatting.
//!
//! Raw generations are square; card avatars are 90x60. The raw image is scaled
//! to 60x60 with nearest-neighbour sampling and centred on a canvas filled with
//! the raw image's dominant colour.

use crate::avatar::layout::{create_exclusive, create_next_free, AvatarLayout};
use crate::error::{ApiError, StorageError};
use crate::provider::{AvatarPostProcessor, RawImage};
use crate::types::ResourceRef;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const AVATAR_WIDTH: u32 = 90;
pub const AVATAR_HEIGHT: u32 = 60;
const SPRITE_SIZE: u32 = 60;

pub struct PixelAvatarFormatter {
    layout: AvatarLayout,
}

impl PixelAvatarFormatter {
    pub fn new(layout: AvatarLayout) -> Self {
        Self { layout }
    }

    /// Claim `avatar_<raw stem>.png`, or the next free `avatar_<base>_<n>.png`
    /// when that name is already taken in the avatar directory.
    fn claim_avatar_file(&self, raw_stem: &str) -> Result<(PathBuf, File), ApiError> {
        let dir = &self.layout.avatar_dir;
        std::fs::create_dir_all(dir).map_err(|e| StorageError::at(dir, e))?;

        let preferred = dir.join(format!("avatar_{}.png", raw_stem));
        if let Some(file) = create_exclusive(&preferred)? {
            return Ok((preferred, file));
        }
        let stem = format!("avatar_{}", numbered_base(raw_stem));
        let (path, file) = create_next_free(dir, &stem, "png")?;
        debug!(
            taken = %preferred.display(),
            avatar = %path.display(),
            "Avatar name taken, using next free name"
        );
        Ok((path, file))
    }
}

/// `fox_3` -> `fox`; stems without a numeric suffix are returned as is.
fn numbered_base(stem: &str) -> &str {
    match stem.rsplit_once('_') {
        Some((base, n)) if !base.is_empty() && is_number(n) => base,
        _ => stem,
    }
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn write_png(path: &Path, file: File, avatar: &RgbImage) -> Result<(), ApiError> {
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer)
        .write_image(avatar.as_raw(), avatar.width(), avatar.height(), ColorType::Rgb8)
        .map_err(|e| {
            ApiError::GenerationFailed(format!("Failed to write {}: {}", path.display(), e))
        })?;
    writer.flush().map_err(|e| StorageError::at(path, e))?;
    Ok(())
}

/// Most frequent colour; ties go to the smallest RGB value so output is stable.
pub fn dominant_color(img: &RgbImage) -> Rgb<u8> {
    let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
    for pixel in img.pixels() {
        *counts.entry(pixel.0).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(ca, na), (cb, nb)| na.cmp(nb).then_with(|| cb.cmp(ca)))
        .map(|(color, _)| Rgb(color))
        .unwrap_or(Rgb([0, 0, 0]))
}

pub fn compose_avatar(raw: &RgbImage) -> RgbImage {
    let background = dominant_color(raw);
    let sprite = imageops::resize(raw, SPRITE_SIZE, SPRITE_SIZE, FilterType::Nearest);
    let mut canvas = RgbImage::from_pixel(AVATAR_WIDTH, AVATAR_HEIGHT, background);
    let x = ((AVATAR_WIDTH - SPRITE_SIZE) / 2) as i64;
    imageops::overlay(&mut canvas, &sprite, x, 0);
    canvas
}

impl AvatarPostProcessor for PixelAvatarFormatter {
    fn format(&self, raw: &RawImage) -> Result<ResourceRef, ApiError> {
        let raw_stem = raw
            .path
            .file_stem()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ApiError::GenerationFailed(format!(
                    "Raw image has no usable file name: {}",
                    raw.path.display()
                ))
            })?;

        let decoded = image::open(&raw.path).map_err(|e| {
            ApiError::GenerationFailed(format!("Failed to decode {}: {}", raw.path.display(), e))
        })?;
        let avatar = compose_avatar(&decoded.to_rgb8());

        let (avatar_path, file) = self.claim_avatar_file(raw_stem)?;
        if let Err(e) = write_png(&avatar_path, file, &avatar) {
            let _ = std::fs::remove_file(&avatar_path);
            return Err(e);
        }
        let avatar_name = avatar_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ApiError::GenerationFailed(format!(
                    "Avatar path has no usable file name: {}",
                    avatar_path.display()
                ))
            })?;

        debug!(raw = %raw.path.display(), avatar = %avatar_path.display(), "Formatted avatar");
        Ok(self.layout.reference_for(avatar_name))
    }
}
