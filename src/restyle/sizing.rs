// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Processing-size negotiation
//!
//! Diffusion backends work on a bounded resolution aligned to an 8px grid.
//! Sources that already fit are processed at their own size; larger sources
//! are scaled so the long side equals the maximum, then truncated to the grid.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};

use super::types::{Dimensions, RestyleError};

pub const DEFAULT_MAX_DIMENSION: u32 = 512;

/// Model grid: processing dimensions are multiples of this
pub const SIZE_QUANTUM: u32 = 8;

/// Smallest accepted source side
pub const MIN_SOURCE_DIMENSION: u32 = SIZE_QUANTUM;

/// Compute the processing resolution for a source of `source` dimensions.
///
/// Truncation to the grid can shift the aspect ratio by less than one grid
/// step per side.
pub fn negotiate_size(source: Dimensions, max_dimension: u32) -> Result<Dimensions, RestyleError> {
    if source.is_empty() {
        return Err(RestyleError::ZeroArea(source));
    }
    if source.width < MIN_SOURCE_DIMENSION || source.height < MIN_SOURCE_DIMENSION {
        return Err(RestyleError::SourceTooSmall {
            dimensions: source,
            min: MIN_SOURCE_DIMENSION,
        });
    }
    if max_dimension < SIZE_QUANTUM {
        return Err(RestyleError::Config(format!(
            "max dimension {} is below the {}px grid",
            max_dimension, SIZE_QUANTUM
        )));
    }

    if source.width <= max_dimension && source.height <= max_dimension {
        return Ok(source);
    }

    // Integer floor of the exact real-valued scale
    let (w, h, max) = (source.width as u64, source.height as u64, max_dimension as u64);
    let (scaled_w, scaled_h) = if source.width > source.height {
        (max, max * h / w)
    } else {
        (max * w / h, max)
    };

    let negotiated = Dimensions::new(quantize(scaled_w as u32), quantize(scaled_h as u32));
    if negotiated.is_empty() {
        return Err(RestyleError::DegenerateAspect(source));
    }
    Ok(negotiated)
}

/// Truncate down to the nearest multiple of the grid
pub fn quantize(value: u32) -> u32 {
    (value / SIZE_QUANTUM) * SIZE_QUANTUM
}

/// Convert the source to RGB at the processing resolution
pub fn prepare_source(source: &DynamicImage, target: Dimensions) -> RgbImage {
    if Dimensions::of(source) == target {
        return source.to_rgb8();
    }
    source
        .resize_exact(target.width, target.height, FilterType::Lanczos3)
        .to_rgb8()
}
