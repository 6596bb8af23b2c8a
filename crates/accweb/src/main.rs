//! Operator entry point for the ACC dedicated server profile manager
//!
//! Loads configuration, initializes logging, loads every profile under the
//! configured root into the registry, then runs one subcommand against it.
//! A root that cannot be loaded completely is fatal.

use anyhow::{Context, Result};
use clap::Parser;
use profile_registry::ServerRegistry;
use std::sync::Arc;
use tracing::{error, info};

mod cli;
mod commands;
mod config;
mod logging;

use cli::Args;
use config::{AppConfig, ROOT_ENV_VAR};

async fn run(args: Args, config: AppConfig) -> Result<()> {
    info!(
        "📂 Profiles: {} | Mode: {:?}",
        config.profiles.root, config.profiles.mode
    );

    let store = config.document_store();
    let mode = config.profiles.mode;
    let registry = tokio::task::spawn_blocking(move || ServerRegistry::load_all(store, mode))
        .await?
        .with_context(|| format!("Error loading server list from {}", config.profiles.root))?;

    commands::execute(Arc::new(registry), args.command).await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Configuration comes first; logging depends on it.
    let config = match AppConfig::load_from_file(&args.config).await {
        Ok(mut config) => {
            config.apply_overrides(std::env::var(ROOT_ENV_VAR).ok(), &args);
            config
        }
        Err(e) => {
            eprintln!("❌ Failed to load configuration {}: {:#}", args.config.display(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = logging::setup_logging(&config.logging) {
        eprintln!("❌ Failed to initialize logging: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args, config).await {
        error!("❌ {:#}", e);
        std::process::exit(1);
    }
}
