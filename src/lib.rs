// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod diffusion;
pub mod restyle;
pub mod version;
pub mod vision;

pub use diffusion::{DiffusionClient, SidecarConfig};
pub use restyle::{
    BatchItem, BatchOutcome, GenerationRequest, GenerationResult, ModelHandles, RestyleConfig,
    RestyleError, RestylePipeline, Settings, SettingsProfile, VariationSet,
};
