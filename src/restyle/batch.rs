// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch controller: many uploads, one prompt, isolated failures

use futures::stream::{self, StreamExt};
use image::DynamicImage;
use tracing::{error, info, warn};

use super::pipeline::RestylePipeline;
use super::settings::{Settings, SettingsProfile};
use super::types::{BatchEntry, BatchItem, BatchOutcome, RestyleError};
use crate::vision::{decode_image_bytes, ImageError};

/// Hard upper bound on a batch
pub const MAX_BATCH_SIZE: usize = 10;

/// Settings for item `index`: seed offset by the index
pub fn item_settings(base: &Settings, index: usize) -> Settings {
    base.with_seed(base.seed.saturating_add(index as u64))
}

/// Decode one upload, surfacing a read failure recorded by the caller
pub fn decode_item(item: &BatchItem) -> Result<DynamicImage, RestyleError> {
    if let Some(reason) = &item.read_error {
        return Err(ImageError::ReadFailed(reason.clone()).into());
    }
    let (image, _info) = decode_image_bytes(&item.bytes)?;
    Ok(image)
}

/// Process every item (up to the cap) and report per-item outcomes in order.
///
/// Never fails as a whole: decode errors and contract violations become
/// failed entries next to their successful siblings.
pub async fn run_batch(
    pipeline: &RestylePipeline,
    prompt: &str,
    mut items: Vec<BatchItem>,
    settings: &Settings,
) -> BatchOutcome {
    let config = pipeline.config();
    let settings = &settings.clone().sanitized(SettingsProfile::Batch);
    let submitted = items.len();
    if submitted > config.max_batch_size {
        warn!(
            "Batch of {} exceeds limit of {}; dropping {} items",
            submitted,
            config.max_batch_size,
            submitted - config.max_batch_size
        );
        items.truncate(config.max_batch_size);
    }
    info!("Processing batch of {} items", items.len());

    let entries: Vec<BatchEntry> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| async move {
            let outcome = match decode_item(&item) {
                Ok(image) => {
                    pipeline
                        .run(prompt, &image, &item_settings(settings, index))
                        .await
                }
                Err(e) => Err(e),
            }
            .map_err(|e| e.to_string());
            if let Err(e) = &outcome {
                error!("Batch item {} failed: {}", index, e);
            }
            BatchEntry {
                index,
                original_filename: item.filename,
                outcome,
            }
        })
        .buffered(config.max_in_flight.max(1))
        .collect()
        .await;

    let outcome = BatchOutcome {
        entries,
        submitted,
        settings_used: settings.clone(),
    };
    info!(
        "Batch complete: {} succeeded, {} failed",
        outcome.successful(),
        outcome.failed()
    );
    outcome
}
