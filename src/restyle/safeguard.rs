// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Quality safeguard: exposure recovery and cosmetic finishing
//!
//! Runs on every raw or placeholder image, in this order:
//! 1. mean luminance of the incoming image
//! 2. tier 1 ("too dark" or lighting requested): brightness + mild contrast
//! 3. tier 2 (near-black, basic variant only): emergency brightness + contrast
//! 4. color correction, gentler when colors are preserved
//! 5. unsharp mask, skipped when colors are preserved
//! 6. optional integer upscale
//!
//! The enhancement operators follow the usual blend-with-degenerate-image
//! formulation: a factor of 1.0 is the identity.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use tracing::{debug, info};

use super::config::PipelineVariant;
use super::settings::Settings;
use super::types::{Dimensions, QualityReport};

/// Tier 1 triggers below this mean
pub const DARK_THRESHOLD: f32 = 100.0;
/// Tier 1 uses the stronger multiplier below this mean
pub const VERY_DARK_THRESHOLD: f32 = 80.0;
/// Tier 2 triggers below this mean
pub const NEAR_BLACK_THRESHOLD: f32 = 10.0;

const TIER1_STRONG_BRIGHTNESS: f32 = 1.3;
const TIER1_BRIGHTNESS: f32 = 1.2;
const TIER1_CONTRAST: f32 = 1.1;
const TIER2_BRIGHTNESS: f32 = 3.0;
const TIER2_CONTRAST: f32 = 1.5;

const PRESERVED_SATURATION: f32 = 1.1;
const PRESERVED_CONTRAST: f32 = 1.05;
const VIVID_SATURATION: f32 = 1.2;
const VIVID_CONTRAST: f32 = 1.1;

const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_PERCENT: i32 = 120;
const SHARPEN_THRESHOLD: i32 = 3;

/// Mean of every RGB sample, 0-255
pub fn mean_luminance(image: &RgbImage) -> f32 {
    let samples = image.as_raw();
    if samples.is_empty() {
        return 0.0;
    }
    let sum: u64 = samples.iter().map(|&v| v as u64).sum();
    (sum as f64 / samples.len() as f64) as f32
}

#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// ITU-R 601-2 luma of one pixel
#[inline]
fn luma(pixel: &Rgb<u8>) -> u32 {
    let [r, g, b] = pixel.0;
    (r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000
}

/// Scale every channel by `factor`
pub fn adjust_brightness(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = clamp_u8(*channel as f32 * factor);
        }
    }
    out
}

/// Push channels away from (or toward) the image's mean gray level
pub fn adjust_contrast(image: &RgbImage, factor: f32) -> RgbImage {
    let pixels = image.width() as u64 * image.height() as u64;
    if pixels == 0 {
        return image.clone();
    }
    let total: u64 = image.pixels().map(|p| luma(p) as u64).sum();
    let mean = (total as f64 / pixels as f64 + 0.5).floor() as f32;

    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            *channel = clamp_u8(mean + (*channel as f32 - mean) * factor);
        }
    }
    out
}

/// Blend each pixel with its own grayscale value
pub fn adjust_saturation(image: &RgbImage, factor: f32) -> RgbImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let gray = luma(pixel) as f32;
        for channel in pixel.0.iter_mut() {
            *channel = clamp_u8(gray + (*channel as f32 - gray) * factor);
        }
    }
    out
}

/// Unsharp mask; differences below `threshold` are left alone
pub fn unsharp_mask(image: &RgbImage, sigma: f32, percent: i32, threshold: i32) -> RgbImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    let blurred = imageops::blur(image, sigma);
    let mut out = image.clone();
    for (pixel, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for (channel, &smooth) in pixel.0.iter_mut().zip(soft.0.iter()) {
            let src = *channel as i32;
            let diff = src - smooth as i32;
            if diff.abs() >= threshold {
                *channel = (src + diff * percent / 100).clamp(0, 255) as u8;
            }
        }
    }
    out
}

/// Integer upscale with Lanczos resampling
pub fn upscale(image: &RgbImage, factor: u32) -> RgbImage {
    if factor <= 1 {
        return image.clone();
    }
    let target = Dimensions::of(image).scaled(factor);
    imageops::resize(image, target.width, target.height, FilterType::Lanczos3)
}

/// Run the full safeguard chain.
///
/// Both tiers are judged on the mean of the incoming image, so a tier 1
/// boost never hides a near-black result from tier 2.
pub fn apply_safeguards(
    image: RgbImage,
    settings: &Settings,
    variant: PipelineVariant,
    upscale_factor: u32,
) -> (RgbImage, QualityReport) {
    let before = mean_luminance(&image);
    let mut image = image;
    let mut brightness_factor = 1.0;

    let tier1_applied = before < DARK_THRESHOLD || settings.enhance_lighting;
    if tier1_applied {
        brightness_factor = if before < VERY_DARK_THRESHOLD {
            TIER1_STRONG_BRIGHTNESS
        } else {
            TIER1_BRIGHTNESS
        };
        debug!(
            "Tier 1 exposure: mean {:.1}, brightness x{}",
            before, brightness_factor
        );
        image = adjust_brightness(&image, brightness_factor);
        image = adjust_contrast(&image, TIER1_CONTRAST);
    }

    let tier2_applied = variant.recovers_near_black() && before < NEAR_BLACK_THRESHOLD;
    if tier2_applied {
        info!("Near-black output (mean {:.1}); applying emergency recovery", before);
        image = adjust_brightness(&image, TIER2_BRIGHTNESS);
        image = adjust_contrast(&image, TIER2_CONTRAST);
    }

    let (saturation, contrast) = if settings.preserve_colors {
        (PRESERVED_SATURATION, PRESERVED_CONTRAST)
    } else {
        (VIVID_SATURATION, VIVID_CONTRAST)
    };
    image = adjust_saturation(&image, saturation);
    image = adjust_contrast(&image, contrast);

    let sharpened = !settings.preserve_colors;
    if sharpened {
        image = unsharp_mask(&image, SHARPEN_SIGMA, SHARPEN_PERCENT, SHARPEN_THRESHOLD);
    }

    let upscale_factor = settings.enable_upscaling.then_some(upscale_factor);
    if let Some(factor) = upscale_factor {
        image = upscale(&image, factor);
    }

    let report = QualityReport {
        mean_luminance_before: before,
        mean_luminance_after: mean_luminance(&image),
        tier1_applied,
        tier2_applied,
        brightness_factor,
        sharpened,
        upscale_factor,
    };
    (image, report)
}
