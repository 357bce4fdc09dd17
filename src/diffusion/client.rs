// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP sidecar client for depth estimation and ControlNet image generation
//!
//! Talks to an OpenAI-compatible image server that also exposes a depth
//! endpoint. Implements both pipeline backend traits.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use image::{GrayImage, RgbImage};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::SidecarConfig;
use crate::restyle::backend::{BackendError, DepthEstimator, ImageSynthesizer};
use crate::restyle::conditioning::ConditioningMap;
use crate::restyle::params::GenerationParams;
use crate::restyle::types::Dimensions;
use crate::vision::{decode_base64_image, encode_png_base64};

const MAX_STEPS: u32 = 150;

fn default_response_format() -> String {
    "b64_json".to_string()
}

/// Body of a ControlNet generation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlNetRequest {
    pub prompt: String,
    pub model: String,
    /// "WIDTHxHEIGHT", always the conditioning map's size
    pub size: String,
    pub num_inference_steps: u32,
    pub guidance_scale: f32,
    pub strength: f32,
    pub controlnet_conditioning_scale: f32,
    /// Base64 PNG of the depth map
    pub control_image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default = "default_response_format")]
    pub response_format: String,
    pub n: u32,
}

impl ControlNetRequest {
    /// Validate the request fields
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }
        ImageSize::parse(&self.size)?;
        if self.num_inference_steps == 0 || self.num_inference_steps > MAX_STEPS {
            return Err(format!(
                "steps must be between 1 and {}, got {}",
                MAX_STEPS, self.num_inference_steps
            ));
        }
        if !(self.strength > 0.0 && self.strength <= 1.0) {
            return Err(format!("strength must be in (0, 1], got {}", self.strength));
        }
        if self.control_image.is_empty() {
            return Err("control image must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Parse a size string like "512x384"
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let (width, height) = s
            .split_once('x')
            .ok_or_else(|| format!("invalid size format '{}'; expected WIDTHxHEIGHT", s))?;
        let width = width
            .parse::<u32>()
            .map_err(|_| format!("invalid width in '{}'", s))?;
        let height = height
            .parse::<u32>()
            .map_err(|_| format!("invalid height in '{}'", s))?;
        if width == 0 || height == 0 {
            return Err(format!("width and height must be > 0 in '{}'", s));
        }
        Ok(Self { width, height })
    }

    pub fn format(dims: Dimensions) -> String {
        format!("{}x{}", dims.width, dims.height)
    }
}

// --- OpenAI-compatible response types ---

#[derive(Debug, Deserialize)]
pub struct OpenAIImageResponse {
    pub data: Vec<OpenAIImageData>,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIImageData {
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DepthResponse {
    /// Base64 PNG of the depth field, any resolution
    pub depth: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelList {
    data: Vec<OpenAIModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelEntry {
    id: String,
}

/// Sidecar client
pub struct DiffusionClient {
    client: Client,
    endpoint: String,
    depth_endpoint: String,
    model_name: String,
}

impl DiffusionClient {
    pub fn new(config: &SidecarConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid sidecar config: {}", e))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = config.diffusion_endpoint.trim_end_matches('/').to_string();
        let depth_endpoint = config.depth_endpoint.trim_end_matches('/').to_string();
        info!(
            "Diffusion client configured: endpoint={}, depth={}, model={}",
            endpoint, depth_endpoint, config.model_name
        );

        Ok(Self {
            client,
            endpoint,
            depth_endpoint,
            model_name: config.model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn depth_endpoint(&self) -> &str {
        &self.depth_endpoint
    }

    /// Check if the sidecar is healthy
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("Diffusion health check failed: {}", e);
                false
            }
        }
    }

    /// List available models from the sidecar
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/v1/models", self.endpoint);
        debug!("Diffusion list_models GET {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "diffusion sidecar returned {}: {}",
                status,
                text
            ));
        }

        let model_list: OpenAIModelList = response.json().await?;
        Ok(model_list.data.into_iter().map(|m| m.id).collect())
    }

    /// Build the wire request for one generation call
    pub fn build_request(
        &self,
        params: &GenerationParams,
        conditioning: &ConditioningMap,
    ) -> std::result::Result<ControlNetRequest, BackendError> {
        let control_image = encode_png_base64(&conditioning.to_rgb())
            .map_err(|e| BackendError::Request(e.to_string()))?;
        Ok(ControlNetRequest {
            prompt: params.prompt.clone(),
            model: self.model_name.clone(),
            size: ImageSize::format(conditioning.dimensions()),
            num_inference_steps: params.steps,
            guidance_scale: params.guidance_scale,
            strength: params.strength,
            controlnet_conditioning_scale: params.conditioning_scale,
            control_image,
            seed: params.seed.seed(),
            negative_prompt: Some(params.negative_prompt.clone()),
            response_format: default_response_format(),
            n: params.num_images,
        })
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> std::result::Result<R, BackendError> {
        debug!("Sidecar POST {}", url);
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Unavailable(e.to_string())
                } else {
                    BackendError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::Request(format!(
                "sidecar returned {}: {}",
                status, text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl DepthEstimator for DiffusionClient {
    async fn estimate_depth(&self, image: &RgbImage) -> std::result::Result<GrayImage, BackendError> {
        let encoded =
            encode_png_base64(image).map_err(|e| BackendError::Request(e.to_string()))?;
        let body = serde_json::json!({
            "image": encoded,
            "response_format": "b64_json",
        });
        let url = format!("{}/v1/depth", self.depth_endpoint);
        let response: DepthResponse = self.post_json(&url, &body).await?;

        let (depth, _info) = decode_base64_image(&response.depth)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(depth.to_luma8())
    }

    fn name(&self) -> &str {
        "sidecar-depth"
    }
}

#[async_trait]
impl ImageSynthesizer for DiffusionClient {
    async fn synthesize(
        &self,
        params: &GenerationParams,
        conditioning: &ConditioningMap,
    ) -> std::result::Result<RgbImage, BackendError> {
        let request = self.build_request(params, conditioning)?;
        request.validate().map_err(BackendError::Request)?;

        let url = format!("{}/v1/images/generations", self.endpoint);
        let response: OpenAIImageResponse = self.post_json(&url, &request).await?;
        let first = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::BadResponse("empty response from sidecar".to_string()))?;
        let b64 = first
            .b64_json
            .ok_or_else(|| BackendError::BadResponse("no b64_json in response".to_string()))?;

        let (image, _info) =
            decode_base64_image(&b64).map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(image.to_rgb8())
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
