// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Variation sweep: several renditions of one request across seeds and guidance

use futures::stream::{self, StreamExt};
use tracing::info;

use super::pipeline::RestylePipeline;
use super::settings::{Settings, SettingsProfile, DEFAULT_GUIDANCE_SCALE};
use super::sizing::negotiate_size;
use super::types::{GenerationRequest, RestyleError, VariationSet};

/// Hard upper bound on a sweep
pub const MAX_VARIATIONS: usize = 5;

const GUIDANCE_STEP: f32 = 0.5;
const GUIDANCE_OFFSET: f32 = -1.0;
const MIN_GUIDANCE: f32 = 1.0;
const MAX_GUIDANCE: f32 = 20.0;

/// Clamp a requested count into `1..=max`
pub fn clamp_variation_count(requested: usize, max: usize) -> usize {
    requested.clamp(1, max.clamp(1, MAX_VARIATIONS))
}

/// Guidance scale for variation `index`, always within `[1, 20]`
pub fn variation_guidance(base: f32, index: usize) -> f32 {
    let base = if base.is_finite() {
        base
    } else {
        DEFAULT_GUIDANCE_SCALE
    };
    (base + index as f32 * GUIDANCE_STEP + GUIDANCE_OFFSET).clamp(MIN_GUIDANCE, MAX_GUIDANCE)
}

/// Settings for variation `index`: seed offset by the index, guidance swept
pub fn variation_settings(base: &Settings, index: usize) -> Settings {
    base.with_seed(base.seed.saturating_add(index as u64))
        .with_guidance_scale(variation_guidance(base.guidance_scale, index))
}

/// Per-variation settings, in index order
pub fn variation_plan(base: &Settings, count: usize) -> Vec<Settings> {
    (0..count).map(|i| variation_settings(base, i)).collect()
}

/// Run a sweep; results keep index order regardless of scheduling
pub async fn run_variations(
    pipeline: &RestylePipeline,
    request: &GenerationRequest,
    count: usize,
) -> Result<VariationSet, RestyleError> {
    let config = pipeline.config();
    negotiate_size(request.source_dimensions(), config.max_dimension)?;

    let count = clamp_variation_count(count, config.max_variations);
    let base = request.settings.clone().sanitized(SettingsProfile::Variations);
    let plan = variation_plan(&base, count);
    info!(
        "Generating {} variations (base seed {}, base guidance {})",
        count, base.seed, base.guidance_scale
    );

    let prompt = request.prompt.as_str();
    let source = &request.source_image;
    let results: Vec<_> = stream::iter(plan)
        .map(|settings| async move { pipeline.run(prompt, source, &settings).await })
        .buffered(config.max_in_flight.max(1))
        .collect()
        .await;

    Ok(VariationSet {
        base_settings: base,
        results: results.into_iter().collect::<Result<Vec<_>, _>>()?,
    })
}
