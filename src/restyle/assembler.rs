// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Result assembly: output geometry and result packaging

use std::time::Duration;

use chrono::Utc;
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;
use uuid::Uuid;

use super::params::SeedMode;
use super::settings::Settings;
use super::types::{Dimensions, GenerationResult, QualityReport};

/// Output size for a run: the source size, times the factor when upscaled
pub fn output_dimensions(original: Dimensions, upscale_factor: Option<u32>) -> Dimensions {
    match upscale_factor {
        Some(factor) => original.scaled(factor),
        None => original,
    }
}

/// Resize a post-processed image to its final output size
pub fn restore_geometry(
    image: RgbImage,
    original: Dimensions,
    upscale_factor: Option<u32>,
) -> RgbImage {
    let target = output_dimensions(original, upscale_factor);
    let current = Dimensions::of(&image);
    if current == target {
        return image;
    }
    debug!("Restoring geometry {} -> {}", current, target);
    imageops::resize(&image, target.width, target.height, FilterType::Lanczos3)
}

/// Everything gathered during one run, ready to be packaged
#[derive(Debug)]
pub struct AssemblyParts {
    pub image: RgbImage,
    pub original_dimensions: Dimensions,
    pub processing_dimensions: Dimensions,
    pub settings: Settings,
    pub effective_prompt: String,
    pub seed: SeedMode,
    pub placeholder_reason: Option<String>,
    pub quality: QualityReport,
    pub elapsed: Duration,
}

/// Restore geometry and build the [`GenerationResult`]
pub fn assemble_result(parts: AssemblyParts) -> GenerationResult {
    let image = restore_geometry(
        parts.image,
        parts.original_dimensions,
        parts.quality.upscale_factor,
    );
    let output_dimensions = Dimensions::of(&image);

    GenerationResult {
        id: Uuid::new_v4(),
        image,
        original_dimensions: parts.original_dimensions,
        processing_dimensions: parts.processing_dimensions,
        output_dimensions,
        settings_used: parts.settings,
        effective_prompt: parts.effective_prompt,
        seed_used: parts.seed.seed(),
        placeholder_reason: parts.placeholder_reason,
        quality: parts.quality,
        processing_time_ms: parts.elapsed.as_millis() as u64,
        created_at: Utc::now(),
    }
}
