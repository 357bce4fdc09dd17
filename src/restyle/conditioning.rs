// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Depth-based conditioning map extraction

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};
use tracing::debug;

use super::backend::{BackendError, ModelHandles};
use super::types::Dimensions;

/// Single-channel structural map aligned 1:1 with the resized source
#[derive(Debug, Clone, PartialEq)]
pub struct ConditioningMap {
    map: GrayImage,
}

impl ConditioningMap {
    pub fn new(map: GrayImage) -> Self {
        Self { map }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.map)
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.map
    }

    /// Replicated 3-channel form, as ControlNet depth models expect
    pub fn to_rgb(&self) -> RgbImage {
        DynamicImage::ImageLuma8(self.map.clone()).to_rgb8()
    }

    pub fn into_inner(self) -> GrayImage {
        self.map
    }
}

/// Estimate depth for the resized source and align it to the source grid.
///
/// The depth backend may answer at its own resolution; the field is always
/// resampled back to `resized`'s exact dimensions before use.
pub async fn extract_conditioning(
    resized: &RgbImage,
    handles: &ModelHandles,
    equalize: bool,
) -> Result<ConditioningMap, BackendError> {
    let raw = handles.estimate_depth(resized).await?;
    let target = Dimensions::of(resized);
    let mut aligned = align_depth(raw, target)?;
    if equalize {
        equalize_histogram(&mut aligned);
    }
    Ok(ConditioningMap::new(aligned))
}

/// Resample a raw depth field to `target`
pub fn align_depth(raw: GrayImage, target: Dimensions) -> Result<GrayImage, BackendError> {
    let raw_dims = Dimensions::of(&raw);
    if raw_dims.is_empty() {
        return Err(BackendError::BadResponse(
            "depth backend returned an empty map".to_string(),
        ));
    }
    if raw_dims == target {
        return Ok(raw);
    }
    debug!("Re-aligning depth map {} -> {}", raw_dims, target);
    Ok(imageops::resize(
        &raw,
        target.width,
        target.height,
        FilterType::Triangle,
    ))
}

/// Global histogram equalization of an 8-bit map, in place.
///
/// A map holding a single intensity is left unchanged.
pub fn equalize_histogram(map: &mut GrayImage) {
    let total = map.width() as u64 * map.height() as u64;
    if total == 0 {
        return;
    }

    let mut hist = [0u64; 256];
    for pixel in map.pixels() {
        hist[pixel[0] as usize] += 1;
    }

    let Some(first) = hist.iter().position(|&count| count > 0) else {
        return;
    };
    let cdf_min = hist[first];
    if cdf_min == total {
        return;
    }

    let scale = 255.0 / (total - cdf_min) as f64;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u64;
    for (value, count) in hist.iter().enumerate() {
        cumulative += count;
        if value <= first {
            continue;
        }
        lut[value] = ((cumulative - cdf_min) as f64 * scale).round().clamp(0.0, 255.0) as u8;
    }

    for pixel in map.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
}
