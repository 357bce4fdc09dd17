// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image I/O shared by the pipeline, the sidecar client and the CLI

pub mod image_utils;

pub use image_utils::{
    decode_base64_image, decode_image_bytes, detect_format, encode_png, encode_png_base64,
    ImageError, ImageInfo,
};
