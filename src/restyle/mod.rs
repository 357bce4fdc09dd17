// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Room restyle: depth-conditioned generation and post-processing
//!
//! A source photo and a style prompt go in; a restyled image of the same
//! dimensions (or an integer multiple, when upscaling) comes out. Model
//! backends are injected through [`ModelHandles`] so tests can substitute
//! fakes.

pub mod assembler;
pub mod backend;
pub mod batch;
pub mod conditioning;
pub mod config;
pub mod invoker;
pub mod params;
pub mod pipeline;
pub mod prompt;
pub mod safeguard;
pub mod settings;
pub mod sizing;
pub mod types;
pub mod variations;

pub use backend::{BackendError, DepthEstimator, ImageSynthesizer, ModelHandles};
pub use conditioning::ConditioningMap;
pub use config::{PipelineVariant, RestyleConfig};
pub use invoker::{SynthesisOutcome, PLACEHOLDER_LABEL};
pub use params::{GenerationParams, SeedMode};
pub use pipeline::RestylePipeline;
pub use settings::{Settings, SettingsOverrides, SettingsProfile, StylePreset, STYLE_PRESETS};
pub use types::{
    BatchEntry, BatchItem, BatchOutcome, Dimensions, GenerationRequest, GenerationResult,
    QualityReport, RestyleError, ResultSummary, VariationSet,
};
