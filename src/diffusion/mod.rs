// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Depth and ControlNet generation via an HTTP sidecar

pub mod client;
pub mod config;

pub use client::{ControlNetRequest, DiffusionClient, ImageSize};
pub use config::SidecarConfig;
