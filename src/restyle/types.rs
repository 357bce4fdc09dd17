// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Core types for the restyle pipeline

use std::fmt;

use chrono::{DateTime, Utc};
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::settings::Settings;
use crate::vision::ImageError;

/// Width/height pair in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of any image view
    pub fn of<I: GenericImageView>(image: &I) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Both sides multiplied by an integer factor
    pub fn scaled(&self, factor: u32) -> Self {
        Self {
            width: self.width.saturating_mul(factor),
            height: self.height.saturating_mul(factor),
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Errors that abort a pipeline call.
///
/// Backend failures never appear here: they are recovered by the generation
/// invoker. Only contract violations on the caller's input do.
#[derive(Debug, Error)]
pub enum RestyleError {
    #[error("Source image has zero area ({0})")]
    ZeroArea(Dimensions),

    #[error("Source image {dimensions} is below the minimum of {min}px per side")]
    SourceTooSmall { dimensions: Dimensions, min: u32 },

    #[error("Aspect ratio of {0} is too extreme to fit the processing grid")]
    DegenerateAspect(Dimensions),

    #[error("Failed to decode source image: {0}")]
    Decode(#[from] ImageError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// A single restyle request: prompt, source photo and settings
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source_image: DynamicImage,
    pub settings: Settings,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, source_image: DynamicImage, settings: Settings) -> Self {
        Self {
            prompt: prompt.into(),
            source_image,
            settings,
        }
    }

    pub fn source_dimensions(&self) -> Dimensions {
        Dimensions::of(&self.source_image)
    }
}

/// What the quality safeguard observed and did for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    /// Mean channel value of the raw (or placeholder) image, 0-255
    pub mean_luminance_before: f32,
    /// Mean channel value after all corrections
    pub mean_luminance_after: f32,
    pub tier1_applied: bool,
    pub tier2_applied: bool,
    /// Brightness multiplier applied by tier 1 (1.0 when tier 1 was skipped)
    pub brightness_factor: f32,
    pub sharpened: bool,
    pub upscale_factor: Option<u32>,
}

/// Output of one pipeline run
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub id: Uuid,
    pub image: RgbImage,
    pub original_dimensions: Dimensions,
    pub processing_dimensions: Dimensions,
    pub output_dimensions: Dimensions,
    /// Effective settings, after defaults were merged in
    pub settings_used: Settings,
    pub effective_prompt: String,
    pub seed_used: Option<u64>,
    /// Set when the backend failed and a placeholder was substituted
    pub placeholder_reason: Option<String>,
    pub quality: QualityReport,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn is_placeholder(&self) -> bool {
        self.placeholder_reason.is_some()
    }

    /// Serializable view without pixel data
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            id: self.id,
            original_dimensions: self.original_dimensions,
            processing_dimensions: self.processing_dimensions,
            output_dimensions: self.output_dimensions,
            settings_used: self.settings_used.clone(),
            effective_prompt: self.effective_prompt.clone(),
            seed_used: self.seed_used,
            placeholder_reason: self.placeholder_reason.clone(),
            quality: self.quality.clone(),
            processing_time_ms: self.processing_time_ms,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSummary {
    pub id: Uuid,
    pub original_dimensions: Dimensions,
    pub processing_dimensions: Dimensions,
    pub output_dimensions: Dimensions,
    pub settings_used: Settings,
    pub effective_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_reason: Option<String>,
    pub quality: QualityReport,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Index-stable results of a variation sweep; entry i used seed base + i
#[derive(Debug, Clone)]
pub struct VariationSet {
    pub base_settings: Settings,
    pub results: Vec<GenerationResult>,
}

impl VariationSet {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Seed each variation was generated with (0 means unseeded)
    pub fn seeds(&self) -> Vec<u64> {
        self.results.iter().map(|r| r.settings_used.seed).collect()
    }
}

/// One encoded upload in a batch
#[derive(Debug, Clone)]
pub struct BatchItem {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
    /// Set when the upload could not be read; the item fails with this reason
    pub read_error: Option<String>,
}

impl BatchItem {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: Some(filename.into()),
            bytes,
            read_error: None,
        }
    }

    /// Placeholder for an upload that never arrived; keeps its slot in the batch
    pub fn unreadable(filename: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            filename,
            bytes: Vec::new(),
            read_error: Some(reason.into()),
        }
    }
}

/// Per-item record in a batch outcome
#[derive(Debug)]
pub struct BatchEntry {
    pub index: usize,
    pub original_filename: Option<String>,
    pub outcome: Result<GenerationResult, String>,
}

impl BatchEntry {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

/// Ordered outcome of a batch run: one entry per processed input
#[derive(Debug)]
pub struct BatchOutcome {
    pub entries: Vec<BatchEntry>,
    /// Inputs handed to the controller, including any beyond the batch cap
    pub submitted: usize,
    pub settings_used: Settings,
}

impl BatchOutcome {
    pub fn total_processed(&self) -> usize {
        self.entries.len()
    }

    pub fn successful(&self) -> usize {
        self.entries.iter().filter(|e| e.success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total_processed() - self.successful()
    }

    /// Inputs dropped because the batch exceeded its cap
    pub fn truncated(&self) -> usize {
        self.submitted.saturating_sub(self.entries.len())
    }
}
