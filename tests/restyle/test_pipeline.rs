// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Single-image pipeline behaviour with fake backends

use std::sync::Arc;

use fabstir_restyle_node::restyle::conditioning::ConditioningMap;
use fabstir_restyle_node::restyle::invoker::invoke_generation;
use fabstir_restyle_node::restyle::params::shape_params;
use fabstir_restyle_node::restyle::prompt::QUALITY_PHRASE;
use fabstir_restyle_node::restyle::{
    Dimensions, GenerationRequest, ModelHandles, PipelineVariant, RestyleConfig, RestyleError,
    Settings, PLACEHOLDER_LABEL,
};
use image::{DynamicImage, GrayImage, RgbImage};

use super::support::{
    default_pipeline, pipeline_with, pipeline_with_config, room_photo, FakeDepth, FakeSynth,
};

fn plain() -> Settings {
    Settings {
        enhance_lighting: false,
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_output_matches_source_dimensions() {
    let (pipeline, _) = default_pipeline();
    for (w, h) in [(1024, 768), (1023, 767), (300, 200), (640, 1280), (8, 8)] {
        let request = GenerationRequest::new("bright loft", room_photo(w, h), plain());
        let result = pipeline.generate_one(&request).await.unwrap();
        assert_eq!(result.output_dimensions, Dimensions::new(w, h));
        assert_eq!(result.image.dimensions(), (w, h));
        assert_eq!(result.original_dimensions, Dimensions::new(w, h));
        assert!(!result.is_placeholder());
    }
}

#[tokio::test]
async fn test_processing_dimensions_recorded() {
    let (pipeline, _) = default_pipeline();
    let request = GenerationRequest::new("loft", room_photo(1024, 768), plain());
    let result = pipeline.generate_one(&request).await.unwrap();
    assert_eq!(result.processing_dimensions, Dimensions::new(512, 384));
}

#[tokio::test]
async fn test_upscaling_doubles_original() {
    let (pipeline, _) = default_pipeline();
    let settings = Settings {
        enable_upscaling: true,
        ..plain()
    };
    for (w, h) in [(1024, 768), (300, 200), (1001, 655)] {
        let request = GenerationRequest::new("loft", room_photo(w, h), settings.clone());
        let result = pipeline.generate_one(&request).await.unwrap();
        assert_eq!(result.output_dimensions, Dimensions::new(w * 2, h * 2));
        assert_eq!(result.quality.upscale_factor, Some(2));
    }
}

#[tokio::test]
async fn test_synthesis_failure_yields_placeholder_result() {
    let synth = Arc::new(FakeSynth::failing());
    let pipeline = pipeline_with(FakeDepth::matching(), synth.clone());
    let request = GenerationRequest::new("loft", room_photo(800, 600), plain());

    let result = pipeline.generate_one(&request).await.unwrap();

    assert!(result.is_placeholder());
    let reason = result.placeholder_reason.as_deref().unwrap();
    assert!(reason.starts_with(PLACEHOLDER_LABEL));
    assert!(reason.contains("CUDA out of memory"));
    assert_eq!(result.output_dimensions, Dimensions::new(800, 600));
    assert_eq!(synth.recorded().len(), 1);
}

#[tokio::test]
async fn test_placeholder_has_conditioning_dimensions() {
    let handles = ModelHandles::new(
        Arc::new(FakeDepth::matching()),
        Arc::new(FakeSynth::failing()),
    );
    let conditioning = ConditioningMap::new(GrayImage::new(512, 384));
    let params = shape_params("loft", &Settings::default());

    let outcome = invoke_generation(&handles, &params, &conditioning).await;

    assert!(outcome.is_placeholder());
    assert_eq!(outcome.image().dimensions(), (512, 384));
}

#[tokio::test]
async fn test_depth_failure_yields_placeholder_without_synthesis() {
    let synth = Arc::new(FakeSynth::new([150, 150, 150]));
    let pipeline = pipeline_with(FakeDepth::failing(), synth.clone());
    let request = GenerationRequest::new("loft", room_photo(640, 480), plain());

    let result = pipeline.generate_one(&request).await.unwrap();

    assert!(result.is_placeholder());
    assert!(result.placeholder_reason.unwrap().contains("depth model not loaded"));
    assert_eq!(result.output_dimensions, Dimensions::new(640, 480));
    assert!(synth.recorded().is_empty());
}

#[tokio::test]
async fn test_depth_at_other_resolution_is_realigned() {
    let synth = Arc::new(FakeSynth::new([150, 150, 150]));
    let pipeline = pipeline_with(FakeDepth::fixed(384, 384), synth.clone());
    let request = GenerationRequest::new("loft", room_photo(1024, 768), plain());

    let result = pipeline.generate_one(&request).await.unwrap();

    assert!(!result.is_placeholder());
    assert_eq!(result.output_dimensions, Dimensions::new(1024, 768));
}

#[tokio::test]
async fn test_zero_area_source_fails_fast() {
    let (pipeline, synth) = default_pipeline();
    let request = GenerationRequest::new(
        "loft",
        DynamicImage::ImageRgb8(RgbImage::new(0, 0)),
        Settings::default(),
    );
    let err = pipeline.generate_one(&request).await.unwrap_err();
    assert!(matches!(err, RestyleError::ZeroArea(_)));
    assert!(synth.recorded().is_empty());
}

#[tokio::test]
async fn test_bright_output_gets_no_tier1() {
    let (pipeline, _) = default_pipeline();
    let request = GenerationRequest::new("loft", room_photo(256, 256), plain());
    let result = pipeline.generate_one(&request).await.unwrap();
    assert!(!result.quality.tier1_applied);
    assert_eq!(result.quality.brightness_factor, 1.0);
}

#[tokio::test]
async fn test_near_black_output_recovery_depends_on_variant() {
    let basic = RestyleConfig {
        variant: PipelineVariant::Basic,
        ..RestyleConfig::default()
    };
    let dark = || Arc::new(FakeSynth::new([3, 3, 3]));
    let request = GenerationRequest::new("loft", room_photo(256, 256), plain());

    let advanced = pipeline_with(FakeDepth::matching(), dark());
    let advanced = advanced.generate_one(&request).await.unwrap();
    let basic = pipeline_with_config(FakeDepth::matching(), dark(), basic);
    let basic = basic.generate_one(&request).await.unwrap();

    assert!(advanced.quality.tier1_applied);
    assert!(!advanced.quality.tier2_applied);
    assert!(basic.quality.tier2_applied);
    assert!(basic.quality.mean_luminance_after > advanced.quality.mean_luminance_after);
}

#[tokio::test]
async fn test_prompt_and_settings_echoed() {
    let (pipeline, synth) = default_pipeline();
    let settings = Settings {
        steps: 28,
        ..Settings::default()
    };
    let request = GenerationRequest::new("scandinavian den", room_photo(128, 96), settings.clone());

    let result = pipeline.generate_one(&request).await.unwrap();

    assert_eq!(result.settings_used, settings);
    assert!(result.effective_prompt.starts_with("scandinavian den, "));
    assert!(result.effective_prompt.contains(QUALITY_PHRASE));
    let calls = synth.recorded();
    assert_eq!(calls[0].prompt, result.effective_prompt);
    assert_eq!(calls[0].steps, 28);
}

#[tokio::test]
async fn test_out_of_contract_settings_repaired_before_synthesis() {
    let (pipeline, synth) = default_pipeline();
    let settings = Settings {
        steps: 0,
        strength: 0.0,
        guidance_scale: f32::NAN,
        ..Settings::default()
    };
    let request = GenerationRequest::new("loft", room_photo(96, 64), settings);

    let result = pipeline.generate_one(&request).await.unwrap();

    let calls = synth.recorded();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].steps, 20);
    assert_eq!(calls[0].strength, 0.8);
    assert_eq!(calls[0].guidance_scale, 7.5);
    assert_eq!(result.settings_used.steps, 20);
    assert_eq!(result.settings_used.strength, 0.8);
    assert_eq!(result.settings_used.guidance_scale, 7.5);
}

#[tokio::test]
async fn test_summary_serializes_without_pixels() {
    let (pipeline, _) = default_pipeline();
    let request = GenerationRequest::new("loft", room_photo(64, 64), Settings::default().with_seed(9));
    let result = pipeline.generate_one(&request).await.unwrap();

    let json = serde_json::to_value(result.summary()).unwrap();
    assert_eq!(json["seedUsed"], 9);
    assert_eq!(json["outputDimensions"]["width"], 64);
    assert!(json.get("placeholderReason").is_none());
    assert!(json["quality"]["meanLuminanceAfter"].as_f64().unwrap() > 0.0);
}
