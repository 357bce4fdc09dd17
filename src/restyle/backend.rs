// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model backend traits and the exclusive handles the pipeline calls through
//!
//! Depth and diffusion models are usually GPU-resident and not reentrant, so
//! each backend sits behind its own async mutex. Concurrent pipeline runs
//! queue on the lock rather than calling the model at the same time.

use std::sync::Arc;

use async_trait::async_trait;
use image::{GrayImage, RgbImage};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use super::conditioning::ConditioningMap;
use super::params::GenerationParams;

/// Failures reported by a model backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Backend request failed: {0}")]
    Request(String),

    #[error("Backend returned an unusable response: {0}")]
    BadResponse(String),

    #[error("Failed to decode backend image: {0}")]
    Decode(String),
}

/// Monocular depth estimation
#[async_trait]
pub trait DepthEstimator: Send + Sync {
    /// Estimate a depth field for `image`. The returned map may be at any
    /// resolution; callers re-align it.
    async fn estimate_depth(&self, image: &RgbImage) -> Result<GrayImage, BackendError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Depth-conditioned image synthesis
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        params: &GenerationParams,
        conditioning: &ConditioningMap,
    ) -> Result<RgbImage, BackendError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Mutex-guarded handles to the two backends, cheap to clone
#[derive(Clone)]
pub struct ModelHandles {
    depth: Arc<Mutex<Arc<dyn DepthEstimator>>>,
    synthesizer: Arc<Mutex<Arc<dyn ImageSynthesizer>>>,
}

impl ModelHandles {
    pub fn new(depth: Arc<dyn DepthEstimator>, synthesizer: Arc<dyn ImageSynthesizer>) -> Self {
        debug!(
            "Model handles: depth={}, synthesizer={}",
            depth.name(),
            synthesizer.name()
        );
        Self {
            depth: Arc::new(Mutex::new(depth)),
            synthesizer: Arc::new(Mutex::new(synthesizer)),
        }
    }

    /// Run depth estimation with exclusive access to the depth backend
    pub async fn estimate_depth(&self, image: &RgbImage) -> Result<GrayImage, BackendError> {
        let backend = self.depth.lock().await;
        backend.estimate_depth(image).await
    }

    /// Run synthesis with exclusive access to the generative backend
    pub async fn synthesize(
        &self,
        params: &GenerationParams,
        conditioning: &ConditioningMap,
    ) -> Result<RgbImage, BackendError> {
        let backend = self.synthesizer.lock().await;
        backend.synthesize(params, conditioning).await
    }

    pub async fn depth_name(&self) -> String {
        self.depth.lock().await.name().to_string()
    }

    pub async fn synthesizer_name(&self) -> String {
        self.synthesizer.lock().await.name().to_string()
    }
}
