// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the restyle pipeline

use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::batch::MAX_BATCH_SIZE;
use super::sizing::{DEFAULT_MAX_DIMENSION, MIN_SOURCE_DIMENSION};
use super::types::RestyleError;
use super::variations::MAX_VARIATIONS;

/// Largest accepted upscale factor
pub const MAX_UPSCALE_FACTOR: u32 = 4;

/// Which post-processing path the pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineVariant {
    /// Full path; no near-black emergency recovery
    #[default]
    Advanced,
    /// Simpler path that also runs near-black (tier 2) recovery
    Basic,
}

impl PipelineVariant {
    pub fn recovers_near_black(&self) -> bool {
        matches!(self, Self::Basic)
    }
}

impl FromStr for PipelineVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "advanced" => Ok(Self::Advanced),
            "basic" => Ok(Self::Basic),
            other => Err(format!("Unknown pipeline variant: {}", other)),
        }
    }
}

impl fmt::Display for PipelineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advanced => write!(f, "advanced"),
            Self::Basic => write!(f, "basic"),
        }
    }
}

/// Pipeline tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestyleConfig {
    /// Longest processing side in pixels
    pub max_dimension: u32,
    /// Integer factor used when upscaling is requested
    pub upscale_factor: u32,
    /// Upper bound on a variation sweep
    pub max_variations: usize,
    /// Upper bound on a batch; extra inputs are dropped
    pub max_batch_size: usize,
    /// Histogram-equalize depth maps before conditioning
    pub equalize_depth: bool,
    pub variant: PipelineVariant,
    /// Items of a sweep or batch run concurrently (1 = sequential)
    pub max_in_flight: usize,
}

impl RestyleConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_dimension: env_parse("RESTYLE_MAX_DIMENSION").unwrap_or(defaults.max_dimension),
            upscale_factor: env_parse("RESTYLE_UPSCALE_FACTOR").unwrap_or(defaults.upscale_factor),
            max_variations: env_parse("RESTYLE_MAX_VARIATIONS").unwrap_or(defaults.max_variations),
            max_batch_size: env_parse("RESTYLE_MAX_BATCH_SIZE").unwrap_or(defaults.max_batch_size),
            equalize_depth: env::var("RESTYLE_EQUALIZE_DEPTH")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.equalize_depth),
            variant: env_parse("RESTYLE_PIPELINE_VARIANT").unwrap_or(defaults.variant),
            max_in_flight: env_parse("RESTYLE_MAX_IN_FLIGHT").unwrap_or(defaults.max_in_flight),
        }
    }

    /// Load configuration from a TOML file; missing keys take defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, RestyleError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RestyleError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RestyleError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| RestyleError::Config(e.to_string()))?;
        config.validate().map_err(RestyleError::Config)?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_dimension < MIN_SOURCE_DIMENSION {
            return Err(format!(
                "Max dimension must be at least {}",
                MIN_SOURCE_DIMENSION
            ));
        }
        if self.upscale_factor == 0 || self.upscale_factor > MAX_UPSCALE_FACTOR {
            return Err(format!(
                "Upscale factor must be in 1..={}",
                MAX_UPSCALE_FACTOR
            ));
        }
        if self.max_variations == 0 || self.max_variations > MAX_VARIATIONS {
            return Err(format!("Max variations must be in 1..={}", MAX_VARIATIONS));
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_BATCH_SIZE {
            return Err(format!("Max batch size must be in 1..={}", MAX_BATCH_SIZE));
        }
        if self.max_in_flight == 0 {
            return Err("Max in-flight items must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for RestyleConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            upscale_factor: 2,
            max_variations: MAX_VARIATIONS,
            max_batch_size: MAX_BATCH_SIZE,
            equalize_depth: true,
            variant: PipelineVariant::Advanced,
            max_in_flight: 1,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
