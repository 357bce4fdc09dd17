// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Variation sweep ordering, seeds and guidance

use std::sync::Arc;

use fabstir_restyle_node::restyle::{
    GenerationRequest, RestyleConfig, RestyleError, SeedMode, Settings, SettingsProfile,
};
use image::{DynamicImage, RgbImage};

use super::support::{default_pipeline, pipeline_with_config, room_photo, FakeDepth, FakeSynth};

fn sweep_settings() -> Settings {
    Settings::for_profile(SettingsProfile::Variations)
}

#[tokio::test]
async fn test_three_variations_seeds_and_guidance() {
    let (pipeline, synth) = default_pipeline();
    let request = GenerationRequest::new("loft", room_photo(320, 240), sweep_settings());

    let set = pipeline.generate_variations(&request, 3).await.unwrap();

    assert_eq!(set.len(), 3);
    assert_eq!(set.seeds(), vec![42, 43, 44]);
    let guidance: Vec<f32> = set
        .results
        .iter()
        .map(|r| r.settings_used.guidance_scale)
        .collect();
    assert_eq!(guidance, vec![6.5, 7.0, 7.5]);

    let sent: Vec<SeedMode> = synth.recorded().iter().map(|p| p.seed).collect();
    assert_eq!(
        sent,
        vec![SeedMode::Fixed(42), SeedMode::Fixed(43), SeedMode::Fixed(44)]
    );
    assert_eq!(set.base_settings, sweep_settings());
}

#[tokio::test]
async fn test_guidance_clamped_at_upper_bound() {
    let (pipeline, _) = default_pipeline();
    let settings = sweep_settings().with_guidance_scale(20.0);
    let request = GenerationRequest::new("loft", room_photo(64, 64), settings);

    let set = pipeline.generate_variations(&request, 5).await.unwrap();

    assert_eq!(set.results[4].settings_used.guidance_scale, 20.0);
    assert_eq!(set.results[0].settings_used.guidance_scale, 19.0);
}

#[tokio::test]
async fn test_non_finite_guidance_repaired_before_sweep() {
    let (pipeline, synth) = default_pipeline();
    let settings = sweep_settings().with_guidance_scale(f32::NAN);
    let request = GenerationRequest::new("loft", room_photo(64, 64), settings);

    let set = pipeline.generate_variations(&request, 2).await.unwrap();

    let sent: Vec<f32> = synth.recorded().iter().map(|p| p.guidance_scale).collect();
    assert_eq!(sent, vec![6.5, 7.0]);
    assert_eq!(set.base_settings.guidance_scale, 7.5);
    assert!(set
        .results
        .iter()
        .all(|r| (1.0..=20.0).contains(&r.settings_used.guidance_scale)));
}

#[tokio::test]
async fn test_count_is_clamped() {
    let (pipeline, _) = default_pipeline();
    let request = GenerationRequest::new("loft", room_photo(64, 64), sweep_settings());

    assert_eq!(pipeline.generate_variations(&request, 0).await.unwrap().len(), 1);
    assert_eq!(pipeline.generate_variations(&request, 12).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_concurrent_sweep_keeps_index_order() {
    let config = RestyleConfig {
        max_in_flight: 3,
        ..RestyleConfig::default()
    };
    let synth = Arc::new(FakeSynth::new([150, 150, 150]));
    let pipeline = pipeline_with_config(FakeDepth::matching(), synth, config);
    let request = GenerationRequest::new("loft", room_photo(128, 128), sweep_settings().with_seed(100));

    let set = pipeline.generate_variations(&request, 5).await.unwrap();

    assert_eq!(set.seeds(), vec![100, 101, 102, 103, 104]);
    assert!(set.results.iter().all(|r| r.output_dimensions.width == 128));
}

#[tokio::test]
async fn test_invalid_source_rejected_before_fan_out() {
    let (pipeline, synth) = default_pipeline();
    let request = GenerationRequest::new(
        "loft",
        DynamicImage::ImageRgb8(RgbImage::new(0, 10)),
        sweep_settings(),
    );

    let err = pipeline.generate_variations(&request, 3).await.unwrap_err();

    assert!(matches!(err, RestyleError::ZeroArea(_)));
    assert!(synth.recorded().is_empty());
}
