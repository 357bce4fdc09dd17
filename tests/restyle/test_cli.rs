// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! CLI command handlers against fake backends and a temp directory

use clap::Parser;
use fabstir_restyle_node::cli::restyle::{
    batch, generate, variations, BatchArgs, GenerateArgs, SettingsArgs, VariationsArgs,
};
use fabstir_restyle_node::cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::support::{default_pipeline, pipeline_with, png_bytes, FakeDepth, FakeSynth};

fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, png_bytes(width, height)).unwrap();
    path
}

#[tokio::test]
async fn test_generate_writes_png_named_by_id() {
    let dir = TempDir::new().unwrap();
    let image = write_png(dir.path(), "living.png", 300, 200);
    let out = dir.path().join("out");
    let args = GenerateArgs {
        image,
        prompt: "warm japandi living room".to_string(),
        settings: SettingsArgs {
            settings: Some(r#"{"seed": 5}"#.to_string()),
            preset: None,
        },
        basic: false,
        output_dir: out.clone(),
    };
    let (pipeline, _) = default_pipeline();

    let summary = generate(&args, &pipeline).await.unwrap();

    let id = summary["id"].as_str().unwrap();
    let written = out.join(format!("{}.png", id));
    assert!(written.exists());
    assert_eq!(summary["outputPath"], written.display().to_string());
    assert_eq!(summary["seedUsed"], 5);
    let decoded = image::open(&written).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (300, 200));
}

#[tokio::test]
async fn test_generate_basic_flag_runs_near_black_recovery() {
    let dir = TempDir::new().unwrap();
    let image = write_png(dir.path(), "cellar.png", 64, 64);
    let args = |basic| GenerateArgs {
        image: image.clone(),
        prompt: "loft".to_string(),
        settings: SettingsArgs::default(),
        basic,
        output_dir: dir.path().join("out"),
    };
    let pipeline = pipeline_with(FakeDepth::matching(), Arc::new(FakeSynth::new([3, 3, 3])));

    let basic = generate(&args(true), &pipeline).await.unwrap();
    let advanced = generate(&args(false), &pipeline).await.unwrap();

    assert_eq!(basic["quality"]["tier2Applied"], true);
    assert_eq!(advanced["quality"]["tier2Applied"], false);
}

#[tokio::test]
async fn test_variations_write_indexed_files() {
    let dir = TempDir::new().unwrap();
    let image = write_png(dir.path(), "den.png", 128, 96);
    let args = VariationsArgs {
        image,
        prompt: String::new(),
        count: 2,
        settings: SettingsArgs::default(),
        output_dir: dir.path().to_path_buf(),
    };
    let (pipeline, _) = default_pipeline();

    let summary = variations(&args, &pipeline).await.unwrap();

    assert_eq!(summary["count"], 2);
    let list = summary["variations"].as_array().unwrap();
    assert_eq!(list[0]["seedUsed"], 42);
    assert_eq!(list[1]["seedUsed"], 43);
    for (i, entry) in list.iter().enumerate() {
        let path = entry["outputPath"].as_str().unwrap();
        assert!(path.ends_with(&format!("_var_{}.png", i)));
        assert!(Path::new(path).exists());
    }
}

#[tokio::test]
async fn test_batch_reports_missing_file_in_place() {
    let dir = TempDir::new().unwrap();
    let images = vec![
        write_png(dir.path(), "a.png", 64, 64),
        dir.path().join("missing.png"),
        write_png(dir.path(), "c.png", 64, 48),
    ];
    let args = BatchArgs {
        images,
        prompt: "loft".to_string(),
        settings: SettingsArgs::default(),
        output_dir: dir.path().join("batch"),
    };
    let (pipeline, _) = default_pipeline();

    let summary = batch(&args, &pipeline).await.unwrap();

    assert_eq!(summary["totalProcessed"], 3);
    assert_eq!(summary["successful"], 2);
    assert_eq!(summary["failed"], 1);
    let results = summary["results"].as_array().unwrap();
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["originalFilename"], "missing.png");
    let error = results[1]["error"].as_str().unwrap();
    assert!(error.contains("Failed to read image"));
    assert!(error.contains("missing.png"));
    assert!(results[2]["outputPath"]
        .as_str()
        .unwrap()
        .ends_with("_batch_2.png"));
}

#[test]
fn test_cli_parses_generate() {
    let cli = Cli::try_parse_from([
        "restyle-cli",
        "generate",
        "--image",
        "room.jpg",
        "--preset",
        "cozy-bedroom",
        "--basic",
    ])
    .unwrap();
    match cli.command {
        Commands::Generate(args) => {
            assert_eq!(args.image, PathBuf::from("room.jpg"));
            assert_eq!(args.settings.preset.as_deref(), Some("cozy-bedroom"));
            assert!(args.basic);
            assert_eq!(args.output_dir, PathBuf::from("images"));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_cli_batch_requires_images() {
    assert!(Cli::try_parse_from(["restyle-cli", "batch", "--prompt", "loft"]).is_err());
}
