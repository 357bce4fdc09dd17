// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod restyle;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::diffusion::{DiffusionClient, SidecarConfig};
use crate::restyle::{ModelHandles, RestyleConfig, RestylePipeline};

/// Room restyle CLI
#[derive(Parser, Debug)]
#[command(name = "restyle-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Depth-conditioned room restyling", long_about = None)]
pub struct Cli {
    /// Pipeline config file (TOML); environment variables are used otherwise
    #[arg(long, global = true, env = "RESTYLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restyle a single photo
    Generate(restyle::GenerateArgs),

    /// Generate several variations of one photo
    Variations(restyle::VariationsArgs),

    /// Restyle several photos with one prompt
    Batch(restyle::BatchArgs),

    /// List style presets
    Presets,

    /// Check the sidecar and list its models
    Health,
}

fn load_config(path: Option<&PathBuf>) -> Result<RestyleConfig> {
    match path {
        Some(path) => RestyleConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(RestyleConfig::from_env()),
    }
}

fn build_pipeline(config_path: Option<&PathBuf>) -> Result<RestylePipeline> {
    let client = Arc::new(DiffusionClient::new(&SidecarConfig::from_env())?);
    let handles = ModelHandles::new(client.clone(), client);
    Ok(RestylePipeline::new(handles, load_config(config_path)?)?)
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_ref();
    let output = match &cli.command {
        Commands::Generate(args) => restyle::generate(args, &build_pipeline(config_path)?).await?,
        Commands::Variations(args) => {
            restyle::variations(args, &build_pipeline(config_path)?).await?
        }
        Commands::Batch(args) => restyle::batch(args, &build_pipeline(config_path)?).await?,
        Commands::Presets => restyle::presets(),
        Commands::Health => {
            let client = DiffusionClient::new(&SidecarConfig::from_env())?;
            restyle::health(&client).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
