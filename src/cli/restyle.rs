// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use image::DynamicImage;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::diffusion::DiffusionClient;
use crate::restyle::{
    BatchItem, GenerationRequest, GenerationResult, PipelineVariant, RestylePipeline, Settings,
    SettingsOverrides, SettingsProfile, StylePreset, STYLE_PRESETS,
};
use crate::vision::{decode_image_bytes, encode_png};

/// Settings flags shared by the generation commands
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Settings as a JSON object (camelCase keys); malformed JSON is ignored
    #[arg(long)]
    pub settings: Option<String>,

    /// Style preset id (see `presets`); explicit settings win over it
    #[arg(long)]
    pub preset: Option<String>,
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Source room photo
    #[arg(long)]
    pub image: PathBuf,

    /// Style prompt; blank derives one from style and room type
    #[arg(long, default_value = "")]
    pub prompt: String,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Run the basic post-processing path (adds near-black recovery)
    #[arg(long)]
    pub basic: bool,

    /// Directory the output PNG is written to
    #[arg(long, default_value = "images")]
    pub output_dir: PathBuf,
}

/// Arguments for the variations command
#[derive(Args, Debug)]
pub struct VariationsArgs {
    #[arg(long)]
    pub image: PathBuf,

    #[arg(long, default_value = "")]
    pub prompt: String,

    /// Number of variations (clamped to 1..=5)
    #[arg(long, default_value_t = 3)]
    pub count: usize,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(long, default_value = "images")]
    pub output_dir: PathBuf,
}

/// Arguments for the batch command
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Source photos (at most 10 are processed)
    #[arg(long, num_args = 1.., required = true)]
    pub images: Vec<PathBuf>,

    #[arg(long, default_value = "")]
    pub prompt: String,

    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(long, default_value = "images")]
    pub output_dir: PathBuf,
}

/// Profile defaults, then the preset, then explicit settings
pub fn resolve_settings(profile: SettingsProfile, args: &SettingsArgs) -> Result<Settings> {
    let mut overrides = SettingsOverrides::default();
    if let Some(id) = &args.preset {
        let preset = StylePreset::find(id).ok_or_else(|| anyhow!("Unknown preset: {}", id))?;
        overrides = overrides.overlay(&preset.overrides());
    }
    if let Some(json) = &args.settings {
        overrides = overrides.overlay(&SettingsOverrides::parse_lenient(json));
    }
    Ok(Settings::resolve(profile, &overrides))
}

fn load_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (image, info) =
        decode_image_bytes(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    info!(
        "Loaded {} ({}x{}, {:?})",
        path.display(),
        info.width,
        info.height,
        info.format
    );
    Ok(image)
}

fn save_result(result: &GenerationResult, output_dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    let path = output_dir.join(name);
    let bytes = encode_png(&DynamicImage::ImageRgb8(result.image.clone()))?;
    std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn result_json(result: &GenerationResult, path: &Path) -> Result<Value> {
    let mut value = serde_json::to_value(result.summary())?;
    value["outputPath"] = json!(path.display().to_string());
    Ok(value)
}

/// Restyle one image and write `{uuid}.png`
pub async fn generate(args: &GenerateArgs, pipeline: &RestylePipeline) -> Result<Value> {
    let settings = resolve_settings(SettingsProfile::Advanced, &args.settings)?;
    let request = GenerationRequest::new(&args.prompt, load_image(&args.image)?, settings);

    let result = if args.basic {
        pipeline
            .with_variant(PipelineVariant::Basic)
            .generate_one(&request)
            .await?
    } else {
        pipeline.generate_one(&request).await?
    };
    let path = save_result(&result, &args.output_dir, &format!("{}.png", result.id))?;
    result_json(&result, &path)
}

/// Run a variation sweep and write `{uuid}_var_{i}.png` per result
pub async fn variations(args: &VariationsArgs, pipeline: &RestylePipeline) -> Result<Value> {
    let settings = resolve_settings(SettingsProfile::Variations, &args.settings)?;
    let request = GenerationRequest::new(&args.prompt, load_image(&args.image)?, settings);

    let set = pipeline.generate_variations(&request, args.count).await?;
    let sweep_id = Uuid::new_v4();
    let mut results = Vec::with_capacity(set.len());
    for (i, result) in set.results.iter().enumerate() {
        let path = save_result(result, &args.output_dir, &format!("{}_var_{}.png", sweep_id, i))?;
        let mut value = result_json(result, &path)?;
        value["index"] = json!(i);
        results.push(value);
    }

    Ok(json!({
        "success": true,
        "count": set.len(),
        "variations": results,
        "baseSettings": set.base_settings,
    }))
}

/// Run a batch and write `{uuid}_batch_{i}.png` per successful item
pub async fn batch(args: &BatchArgs, pipeline: &RestylePipeline) -> Result<Value> {
    let settings = resolve_settings(SettingsProfile::Batch, &args.settings)?;

    // Unreadable files still take their slot so indices match the input order
    let items: Vec<BatchItem> = args
        .images
        .iter()
        .map(|path| {
            let filename = path.file_name().map(|n| n.to_string_lossy().into_owned());
            match std::fs::read(path) {
                Ok(bytes) => BatchItem {
                    filename,
                    bytes,
                    read_error: None,
                },
                Err(e) => {
                    warn!("Could not read {}: {}", path.display(), e);
                    BatchItem::unreadable(filename, format!("{}: {}", path.display(), e))
                }
            }
        })
        .collect();

    let outcome = pipeline.generate_batch(&args.prompt, items, &settings).await;
    let batch_id = Uuid::new_v4();
    let mut results = Vec::with_capacity(outcome.total_processed());
    for entry in &outcome.entries {
        let value = match &entry.outcome {
            Ok(result) => {
                let path = save_result(
                    result,
                    &args.output_dir,
                    &format!("{}_batch_{}.png", batch_id, entry.index),
                )?;
                json!({
                    "success": true,
                    "index": entry.index,
                    "originalFilename": entry.original_filename,
                    "outputPath": path.display().to_string(),
                    "placeholderReason": result.placeholder_reason,
                })
            }
            Err(e) => json!({
                "success": false,
                "index": entry.index,
                "originalFilename": entry.original_filename,
                "error": e,
            }),
        };
        results.push(value);
    }

    Ok(json!({
        "success": true,
        "totalProcessed": outcome.total_processed(),
        "successful": outcome.successful(),
        "failed": outcome.failed(),
        "truncated": outcome.truncated(),
        "results": results,
        "settingsUsed": outcome.settings_used,
    }))
}

/// Style presets as JSON
pub fn presets() -> Value {
    json!({ "presets": STYLE_PRESETS })
}

/// Sidecar health and model list
pub async fn health(client: &DiffusionClient) -> Result<Value> {
    let healthy = client.health_check().await;
    let models = if healthy {
        client.list_models().await.unwrap_or_default()
    } else {
        Vec::new()
    };
    Ok(json!({
        "status": if healthy { "healthy" } else { "unavailable" },
        "endpoint": client.endpoint(),
        "depthEndpoint": client.depth_endpoint(),
        "model": client.model_name(),
        "models": models,
    }))
}
