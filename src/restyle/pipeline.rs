// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! The restyle pipeline and its three entry points
//!
//! One run is strictly sequential: size negotiation, conditioning, prompt
//! composition, parameter shaping, synthesis, quality safeguard, assembly.
//! Sweeps and batches fan out over independent runs that share only the
//! model handles.

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::assembler::{assemble_result, AssemblyParts};
use super::backend::ModelHandles;
use super::batch::run_batch;
use super::conditioning::extract_conditioning;
use super::config::{PipelineVariant, RestyleConfig};
use super::invoker::{invoke_generation, SynthesisOutcome};
use super::params::shape_params;
use super::prompt::compose_prompt;
use super::safeguard::apply_safeguards;
use super::settings::Settings;
use super::sizing::{negotiate_size, prepare_source};
use super::types::{
    BatchItem, BatchOutcome, Dimensions, GenerationRequest, GenerationResult, RestyleError,
    VariationSet,
};
use super::variations::run_variations;

/// Restyle pipeline bound to a pair of model backends
#[derive(Clone)]
pub struct RestylePipeline {
    handles: ModelHandles,
    config: RestyleConfig,
}

impl RestylePipeline {
    pub fn new(handles: ModelHandles, config: RestyleConfig) -> Result<Self, RestyleError> {
        config.validate().map_err(RestyleError::Config)?;
        Ok(Self { handles, config })
    }

    pub fn config(&self) -> &RestyleConfig {
        &self.config
    }

    pub fn handles(&self) -> &ModelHandles {
        &self.handles
    }

    /// Same backends, different post-processing path
    pub fn with_variant(&self, variant: PipelineVariant) -> Self {
        Self {
            handles: self.handles.clone(),
            config: RestyleConfig {
                variant,
                ..self.config.clone()
            },
        }
    }

    /// Restyle one image.
    ///
    /// Backend failures yield a placeholder result; only an unusable source
    /// image is reported as an error.
    pub async fn generate_one(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, RestyleError> {
        self.run(&request.prompt, &request.source_image, &request.settings)
            .await
    }

    /// Several renditions of one request, index-ordered
    pub async fn generate_variations(
        &self,
        request: &GenerationRequest,
        count: usize,
    ) -> Result<VariationSet, RestyleError> {
        run_variations(self, request, count).await
    }

    /// Restyle a batch of uploads with one prompt
    pub async fn generate_batch(
        &self,
        prompt: &str,
        items: Vec<BatchItem>,
        settings: &Settings,
    ) -> BatchOutcome {
        run_batch(self, prompt, items, settings).await
    }

    /// One full pipeline run; out-of-contract settings are repaired first and
    /// the repaired copy is what the backend sees and the result reports
    pub(crate) async fn run(
        &self,
        prompt: &str,
        source: &DynamicImage,
        settings: &Settings,
    ) -> Result<GenerationResult, RestyleError> {
        let started = Instant::now();
        let settings = &settings.clone().sanitized_with(&Settings::default());
        let original = Dimensions::of(source);
        let processing = negotiate_size(original, self.config.max_dimension)?;
        debug!("Processing {} at {}", original, processing);

        let resized = prepare_source(source, processing);
        let effective_prompt = compose_prompt(prompt, settings);
        let params = shape_params(effective_prompt.clone(), settings);

        let outcome = match extract_conditioning(&resized, &self.handles, self.config.equalize_depth)
            .await
        {
            Ok(conditioning) => invoke_generation(&self.handles, &params, &conditioning).await,
            Err(e) => {
                warn!("Depth estimation failed, substituting placeholder: {}", e);
                SynthesisOutcome::placeholder(processing, &e)
            }
        };
        let (raw, placeholder_reason) = outcome.into_parts();

        let (processed, quality) = apply_safeguards(
            raw,
            settings,
            self.config.variant,
            self.config.upscale_factor,
        );

        let result = assemble_result(AssemblyParts {
            image: processed,
            original_dimensions: original,
            processing_dimensions: processing,
            settings: settings.clone(),
            effective_prompt,
            seed: params.seed,
            placeholder_reason,
            quality,
            elapsed: started.elapsed(),
        });

        info!(
            "Restyle {} complete: {} -> {} in {}ms{}",
            result.id,
            result.original_dimensions,
            result.output_dimensions,
            result.processing_time_ms,
            if result.is_placeholder() { " (placeholder)" } else { "" }
        );
        Ok(result)
    }
}
