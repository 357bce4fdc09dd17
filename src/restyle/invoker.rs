// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Generation invoker: one synthesis call with explicit placeholder recovery
//!
//! A failed backend call never reaches the caller as an error. The invoker
//! returns [`SynthesisOutcome::Placeholder`] instead, and the pipeline carries
//! on with post-processing so single-item callers always get a well-formed
//! image back.

use image::{Rgb, RgbImage};
use tracing::{debug, warn};

use super::backend::{BackendError, ModelHandles};
use super::conditioning::ConditioningMap;
use super::params::GenerationParams;
use super::types::Dimensions;

pub const PLACEHOLDER_GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const MARKER_WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const MARKER_OFFSET: u32 = 10;
const MARKER_WIDTH: u32 = 120;
const MARKER_HEIGHT: u32 = 12;

/// Label carried by every placeholder
pub const PLACEHOLDER_LABEL: &str = "Generation Error";

/// Result of one invoker call
#[derive(Debug, Clone)]
pub enum SynthesisOutcome {
    Generated(RgbImage),
    Placeholder { image: RgbImage, reason: String },
}

impl SynthesisOutcome {
    /// Substitute a labeled placeholder of `dims` for a failed call
    pub fn placeholder(dims: Dimensions, error: &BackendError) -> Self {
        Self::Placeholder {
            image: placeholder_image(dims),
            reason: format!("{}: {}", PLACEHOLDER_LABEL, error),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }

    pub fn image(&self) -> &RgbImage {
        match self {
            Self::Generated(image) | Self::Placeholder { image, .. } => image,
        }
    }

    /// Split into the image and, for placeholders, the failure label
    pub fn into_parts(self) -> (RgbImage, Option<String>) {
        match self {
            Self::Generated(image) => (image, None),
            Self::Placeholder { image, reason } => (image, Some(reason)),
        }
    }
}

/// Uniform gray image with a white error marker near the top-left corner
pub fn placeholder_image(dims: Dimensions) -> RgbImage {
    let width = dims.width.max(1);
    let height = dims.height.max(1);
    let mut image = RgbImage::from_pixel(width, height, PLACEHOLDER_GRAY);

    let x_end = (MARKER_OFFSET + MARKER_WIDTH).min(width.saturating_sub(MARKER_OFFSET));
    let y_end = (MARKER_OFFSET + MARKER_HEIGHT).min(height.saturating_sub(MARKER_OFFSET));
    for y in MARKER_OFFSET..y_end {
        for x in MARKER_OFFSET..x_end {
            image.put_pixel(x, y, MARKER_WHITE);
        }
    }
    image
}

/// Call the generative backend once
pub async fn invoke_generation(
    handles: &ModelHandles,
    params: &GenerationParams,
    conditioning: &ConditioningMap,
) -> SynthesisOutcome {
    let dims = conditioning.dimensions();
    debug!(
        "Synthesizing {} (steps={}, guidance={}, strength={}, seed={:?})",
        dims, params.steps, params.guidance_scale, params.strength, params.seed
    );

    match handles.synthesize(params, conditioning).await {
        Ok(image) if Dimensions::of(&image).is_empty() => {
            let error = BackendError::BadResponse("empty image".to_string());
            warn!("Synthesis returned no pixels; substituting placeholder");
            SynthesisOutcome::placeholder(dims, &error)
        }
        Ok(image) => SynthesisOutcome::Generated(image),
        Err(e) => {
            warn!("Synthesis failed, substituting placeholder: {}", e);
            SynthesisOutcome::placeholder(dims, &e)
        }
    }
}
