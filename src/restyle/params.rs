// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Settings -> generative backend call parameters

use serde::Serialize;

use super::prompt::NEGATIVE_PROMPT;
use super::settings::Settings;

/// ControlNet conditioning strength; no setting overrides it yet
pub const DEFAULT_CONDITIONING_SCALE: f32 = 1.0;

/// How the backend's random generator is seeded.
///
/// A settings seed of 0 is a sentinel for "do not fix a seed", not seed zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "seed")]
pub enum SeedMode {
    Unseeded,
    Fixed(u64),
}

impl SeedMode {
    pub fn from_seed(seed: u64) -> Self {
        if seed == 0 {
            Self::Unseeded
        } else {
            Self::Fixed(seed)
        }
    }

    /// The seed to hand the backend, if any
    pub fn seed(&self) -> Option<u64> {
        match self {
            Self::Unseeded => None,
            Self::Fixed(seed) => Some(*seed),
        }
    }

    pub fn is_deterministic(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }
}

/// Everything the generative backend needs besides the conditioning image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub steps: u32,
    pub guidance_scale: f32,
    pub strength: f32,
    pub conditioning_scale: f32,
    pub num_images: u32,
    pub seed: SeedMode,
}

/// Shape backend parameters from an effective prompt and resolved settings
pub fn shape_params(effective_prompt: impl Into<String>, settings: &Settings) -> GenerationParams {
    GenerationParams {
        prompt: effective_prompt.into(),
        negative_prompt: NEGATIVE_PROMPT.to_string(),
        steps: settings.steps,
        guidance_scale: settings.guidance_scale,
        strength: settings.strength,
        conditioning_scale: DEFAULT_CONDITIONING_SCALE,
        num_images: 1,
        seed: SeedMode::from_seed(settings.seed),
    }
}
