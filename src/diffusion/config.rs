// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for the diffusion/depth sidecar

use std::env;

pub const DEFAULT_DIFFUSION_ENDPOINT: &str = "http://localhost:8082";
pub const DEFAULT_DIFFUSION_MODEL: &str = "sd-controlnet-depth";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, PartialEq)]
pub struct SidecarConfig {
    /// Base URL of the image generation sidecar
    pub diffusion_endpoint: String,
    /// Base URL of the depth service; defaults to the diffusion endpoint
    pub depth_endpoint: String,
    pub model_name: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl SidecarConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let diffusion_endpoint = env::var("DIFFUSION_ENDPOINT")
            .unwrap_or_else(|_| DEFAULT_DIFFUSION_ENDPOINT.to_string());
        Self {
            depth_endpoint: env::var("DEPTH_ENDPOINT")
                .unwrap_or_else(|_| diffusion_endpoint.clone()),
            diffusion_endpoint,
            model_name: env::var("DIFFUSION_MODEL")
                .unwrap_or_else(|_| DEFAULT_DIFFUSION_MODEL.to_string()),
            timeout_secs: env::var("SIDECAR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn new(endpoint: &str, model_name: &str) -> Self {
        Self {
            diffusion_endpoint: endpoint.to_string(),
            depth_endpoint: endpoint.to_string(),
            model_name: model_name.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, url) in [
            ("diffusion endpoint", &self.diffusion_endpoint),
            ("depth endpoint", &self.depth_endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("{} must be an http(s) URL, got '{}'", name, url));
            }
        }
        if self.model_name.trim().is_empty() {
            return Err("Model name must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFUSION_ENDPOINT, DEFAULT_DIFFUSION_MODEL)
    }
}
