// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir restyle node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-depth-restyle-2025-11-03";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2025-11-03";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "depth-conditioning",
    "controlnet-sidecar",
    "exposure-recovery",
    "style-presets",
    "variation-sweep",
    "batch-restyle",
    "lanczos-upscale",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Restyle Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
