//! Command-line interface for the accweb profile manager.
//!
//! Argument parsing uses the `clap` derive API. Global flags override the
//! configuration file; the subcommand selects the registry operation.

use clap::{Parser, Subcommand};
use profile_registry::{ProfileId, SlotMode};
use std::path::PathBuf;

/// Manage ACC dedicated server configuration profiles
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    ///
    /// If the file doesn't exist, a default configuration will be created.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the profile root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Override the deployment mode (basic, extended)
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<SlotMode>,

    /// Override the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Registry operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every profile as JSON
    List {
        /// Hide passwords
        #[arg(long)]
        guest: bool,
    },
    /// Print the public status summary of every profile
    Status,
    /// Print one profile as JSON
    Show {
        id: ProfileId,
        /// Hide passwords
        #[arg(long)]
        guest: bool,
    },
    /// Duplicate a profile under the next free id
    Copy { id: ProfileId },
    /// Remove a profile and its directory
    Delete { id: ProfileId },
    /// Pack a profile into `<id>.tar.gz`
    Export {
        id: ProfileId,
        /// Directory the archive is written to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// Hide passwords in the exported settings
        #[arg(long)]
        guest: bool,
    },
    /// Create a new profile from an exported archive or a directory of
    /// slot files
    Import {
        /// Archive produced by `export`
        #[arg(required_unless_present = "dir", conflicts_with = "dir")]
        archive: Option<PathBuf>,
        /// Directory holding configuration.json, settings.json, ...
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Create or overwrite a profile from a full profile JSON document
    Save { file: PathBuf },
}

fn parse_mode(value: &str) -> Result<SlotMode, String> {
    match value {
        "basic" => Ok(SlotMode::Basic),
        "extended" => Ok(SlotMode::Extended),
        other => Err(format!("unknown mode '{}', expected basic or extended", other)),
    }
}
