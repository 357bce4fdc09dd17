// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch isolation, ordering and the batch cap

use std::sync::Arc;

use fabstir_restyle_node::restyle::{BatchItem, RestyleConfig, Settings, SettingsProfile};

use super::support::{default_pipeline, pipeline_with, pipeline_with_config, png_bytes, FakeDepth, FakeSynth};

fn batch_settings() -> Settings {
    Settings::for_profile(SettingsProfile::Batch)
}

fn items(count: usize) -> Vec<BatchItem> {
    (0..count)
        .map(|i| BatchItem::new(format!("room_{}.png", i), png_bytes(96 + 8 * i as u32, 64)))
        .collect()
}

#[tokio::test]
async fn test_corrupt_item_is_isolated() {
    let (pipeline, _) = default_pipeline();
    let mut inputs = items(5);
    inputs[2].bytes = b"definitely not an image".to_vec();

    let outcome = pipeline
        .generate_batch("modern loft", inputs, &batch_settings())
        .await;

    assert_eq!(outcome.total_processed(), 5);
    assert_eq!(outcome.successful(), 4);
    assert_eq!(outcome.failed(), 1);
    let failed: Vec<_> = outcome.entries.iter().filter(|e| !e.success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 2);
    assert_eq!(failed[0].original_filename.as_deref(), Some("room_2.png"));
    assert!(failed[0]
        .error()
        .unwrap()
        .starts_with("Failed to decode source image"));
}

#[tokio::test]
async fn test_unreadable_item_keeps_read_error() {
    let (pipeline, _) = default_pipeline();
    let mut inputs = items(3);
    inputs[1] = BatchItem::unreadable(Some("room_1.png".to_string()), "room_1.png: access denied");

    let outcome = pipeline.generate_batch("loft", inputs, &batch_settings()).await;

    assert_eq!(outcome.successful(), 2);
    let error = outcome.entries[1].error().unwrap();
    assert!(error.contains("Failed to read image"));
    assert!(error.contains("access denied"));
    assert!(!error.contains("empty"));
}

#[tokio::test]
async fn test_out_of_contract_batch_settings_repaired() {
    let synth = Arc::new(FakeSynth::new([150, 150, 150]));
    let pipeline = pipeline_with(FakeDepth::matching(), synth.clone());
    let settings = Settings {
        steps: 0,
        strength: 2.0,
        ..batch_settings()
    };

    let outcome = pipeline.generate_batch("loft", items(2), &settings).await;

    assert_eq!(outcome.successful(), 2);
    assert_eq!(outcome.settings_used, batch_settings());
    assert!(synth.recorded().iter().all(|p| p.steps == 15 && p.strength == 0.8));
}

#[tokio::test]
async fn test_entries_keep_input_order_and_seed_offsets() {
    let config = RestyleConfig {
        max_in_flight: 4,
        ..RestyleConfig::default()
    };
    let synth = Arc::new(FakeSynth::new([150, 150, 150]));
    let pipeline = pipeline_with_config(FakeDepth::matching(), synth, config);
    let settings = batch_settings().with_seed(10);

    let outcome = pipeline.generate_batch("loft", items(4), &settings).await;

    for (i, entry) in outcome.entries.iter().enumerate() {
        assert_eq!(entry.index, i);
        let result = entry.result().unwrap();
        assert_eq!(result.settings_used.seed, 10 + i as u64);
        assert_eq!(result.output_dimensions.width, 96 + 8 * i as u32);
    }
    assert_eq!(outcome.settings_used, settings);
}

#[tokio::test]
async fn test_batch_truncated_to_cap() {
    let (pipeline, _) = default_pipeline();

    let outcome = pipeline.generate_batch("loft", items(12), &batch_settings()).await;

    assert_eq!(outcome.submitted, 12);
    assert_eq!(outcome.total_processed(), 10);
    assert_eq!(outcome.truncated(), 2);
    assert_eq!(outcome.entries.last().unwrap().index, 9);
}

#[tokio::test]
async fn test_backend_failure_is_not_an_item_failure() {
    let pipeline = pipeline_with(FakeDepth::matching(), Arc::new(FakeSynth::failing()));

    let outcome = pipeline.generate_batch("loft", items(3), &batch_settings()).await;

    assert_eq!(outcome.successful(), 3);
    assert!(outcome
        .entries
        .iter()
        .all(|e| e.result().unwrap().is_placeholder()));
}

#[tokio::test]
async fn test_tiny_image_is_an_item_failure() {
    let (pipeline, _) = default_pipeline();
    let mut inputs = items(2);
    inputs[1].bytes = png_bytes(4, 4);

    let outcome = pipeline.generate_batch("loft", inputs, &batch_settings()).await;

    assert_eq!(outcome.successful(), 1);
    assert!(outcome.entries[1].error().unwrap().contains("minimum"));
}

#[tokio::test]
async fn test_empty_batch() {
    let (pipeline, _) = default_pipeline();
    let outcome = pipeline.generate_batch("loft", Vec::new(), &batch_settings()).await;
    assert_eq!(outcome.total_processed(), 0);
    assert_eq!(outcome.failed(), 0);
}
