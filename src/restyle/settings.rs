// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Typed generation settings, per-entry-point default tables and style presets
//!
//! Callers send settings as a loose JSON object (camelCase keys). Parsing is
//! lenient: malformed JSON degrades to an empty override set, and out-of-range
//! values fall back to the profile default, so a bad settings payload never
//! fails a request.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_STEPS: u32 = 20;
/// Sweep entry points trade a little quality for throughput
pub const SWEEP_STEPS: u32 = 15;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 7.5;
pub const DEFAULT_STRENGTH: f32 = 0.8;
pub const DEFAULT_VARIATION_SEED: u64 = 42;
pub const DEFAULT_STYLE: &str = "Modern";
pub const DEFAULT_ROOM_TYPE: &str = "Living Room";

/// Effective settings for one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub steps: u32,
    pub guidance_scale: f32,
    pub strength: f32,
    /// 0 means unseeded
    pub seed: u64,
    pub enable_upscaling: bool,
    pub preserve_colors: bool,
    pub enhance_lighting: bool,
    pub style: String,
    pub room_type: String,
}

/// Which entry point a request came through; each has its own default table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsProfile {
    #[default]
    Advanced,
    Variations,
    Batch,
}

impl SettingsProfile {
    fn default_steps(&self) -> u32 {
        match self {
            Self::Advanced => DEFAULT_STEPS,
            Self::Variations | Self::Batch => SWEEP_STEPS,
        }
    }

    fn default_seed(&self) -> u64 {
        match self {
            Self::Variations => DEFAULT_VARIATION_SEED,
            _ => 0,
        }
    }
}

/// Partial settings as sent by a caller. Every field is optional; unknown keys
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_upscaling: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_colors: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhance_lighting: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

impl SettingsOverrides {
    /// Strict parse; used where the caller wants to report bad JSON
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse a settings payload, treating blank or malformed input as "no overrides"
    pub fn parse_lenient(json: &str) -> Self {
        if json.trim().is_empty() {
            return Self::default();
        }
        match Self::parse(json) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("Ignoring malformed settings payload: {}", e);
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Layer `other` on top of `self`; fields set in `other` win
    pub fn overlay(mut self, other: &SettingsOverrides) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field.clone(); })*
            };
        }
        take!(
            steps,
            guidance_scale,
            strength,
            seed,
            enable_upscaling,
            preserve_colors,
            enhance_lighting,
            style,
            room_type
        );
        self
    }
}

impl Settings {
    /// Default table for an entry point
    pub fn for_profile(profile: SettingsProfile) -> Self {
        Self {
            steps: profile.default_steps(),
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            strength: DEFAULT_STRENGTH,
            seed: profile.default_seed(),
            enable_upscaling: false,
            preserve_colors: false,
            enhance_lighting: true,
            style: DEFAULT_STYLE.to_string(),
            room_type: DEFAULT_ROOM_TYPE.to_string(),
        }
    }

    /// Override-wins merge
    pub fn merge(mut self, overrides: &SettingsOverrides) -> Self {
        if let Some(steps) = overrides.steps {
            self.steps = steps;
        }
        if let Some(guidance_scale) = overrides.guidance_scale {
            self.guidance_scale = guidance_scale;
        }
        if let Some(strength) = overrides.strength {
            self.strength = strength;
        }
        if let Some(seed) = overrides.seed {
            self.seed = seed;
        }
        if let Some(enable_upscaling) = overrides.enable_upscaling {
            self.enable_upscaling = enable_upscaling;
        }
        if let Some(preserve_colors) = overrides.preserve_colors {
            self.preserve_colors = preserve_colors;
        }
        if let Some(enhance_lighting) = overrides.enhance_lighting {
            self.enhance_lighting = enhance_lighting;
        }
        if let Some(ref style) = overrides.style {
            self.style = style.clone();
        }
        if let Some(ref room_type) = overrides.room_type {
            self.room_type = room_type.clone();
        }
        self
    }

    /// Replace values outside the backend contract with the profile default
    pub fn sanitized(self, profile: SettingsProfile) -> Self {
        self.sanitized_with(&Self::for_profile(profile))
    }

    /// Replace values outside the backend contract with those of `defaults`
    pub fn sanitized_with(mut self, defaults: &Settings) -> Self {
        if self.steps == 0 {
            warn!("steps must be positive; using default {}", defaults.steps);
            self.steps = defaults.steps;
        }
        if !self.guidance_scale.is_finite() || self.guidance_scale <= 0.0 {
            warn!(
                "guidanceScale {} is not a positive number; using default {}",
                self.guidance_scale, defaults.guidance_scale
            );
            self.guidance_scale = defaults.guidance_scale;
        }
        if !(self.strength > 0.0 && self.strength <= 1.0) {
            warn!(
                "strength {} is outside (0, 1]; using default {}",
                self.strength, defaults.strength
            );
            self.strength = defaults.strength;
        }
        self
    }

    /// Profile defaults + overrides, sanitized
    pub fn resolve(profile: SettingsProfile, overrides: &SettingsOverrides) -> Self {
        let settings = Self::for_profile(profile).merge(overrides).sanitized(profile);
        debug!("Resolved {:?} settings: {:?}", profile, settings);
        settings
    }

    /// Resolve a raw JSON settings payload; never fails
    pub fn from_json_lenient(json: &str, profile: SettingsProfile) -> Self {
        Self::resolve(profile, &SettingsOverrides::parse_lenient(json))
    }

    /// Copy with a different seed
    pub fn with_seed(&self, seed: u64) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Copy with a different guidance scale
    pub fn with_guidance_scale(&self, guidance_scale: f32) -> Self {
        Self {
            guidance_scale,
            ..self.clone()
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::for_profile(SettingsProfile::default())
    }
}

/// A named bundle of style settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StylePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub style: &'static str,
    pub room_type: &'static str,
    pub strength: f32,
    pub guidance_scale: f32,
    pub enhance_lighting: bool,
}

pub const STYLE_PRESETS: &[StylePreset] = &[
    StylePreset {
        id: "modern-living",
        name: "Modern Living",
        description: "Clean lines, neutral colors, minimalist furniture",
        style: "Modern",
        room_type: "Living Room",
        strength: 0.8,
        guidance_scale: 7.5,
        enhance_lighting: true,
    },
    StylePreset {
        id: "cozy-bedroom",
        name: "Cozy Bedroom",
        description: "Warm colors, soft textures, comfortable atmosphere",
        style: "Traditional",
        room_type: "Bedroom",
        strength: 0.7,
        guidance_scale: 6.0,
        enhance_lighting: true,
    },
    StylePreset {
        id: "luxury-bathroom",
        name: "Luxury Bathroom",
        description: "High-end finishes, spa-like atmosphere",
        style: "Modern",
        room_type: "Bathroom",
        strength: 0.9,
        guidance_scale: 8.0,
        enhance_lighting: true,
    },
    StylePreset {
        id: "minimalist-office",
        name: "Minimalist Office",
        description: "Clean workspace, productivity-focused design",
        style: "Minimalist",
        room_type: "Office",
        strength: 0.8,
        guidance_scale: 7.0,
        enhance_lighting: true,
    },
    StylePreset {
        id: "elegant-dining",
        name: "Elegant Dining",
        description: "Sophisticated dining space for entertaining",
        style: "Traditional",
        room_type: "Dining Room",
        strength: 0.8,
        guidance_scale: 7.5,
        enhance_lighting: true,
    },
];

impl StylePreset {
    /// Look up a preset by id (case-insensitive)
    pub fn find(id: &str) -> Option<&'static StylePreset> {
        STYLE_PRESETS
            .iter()
            .find(|preset| preset.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            strength: Some(self.strength),
            guidance_scale: Some(self.guidance_scale),
            enhance_lighting: Some(self.enhance_lighting),
            style: Some(self.style.to_string()),
            room_type: Some(self.room_type.to_string()),
            ..Default::default()
        }
    }
}
