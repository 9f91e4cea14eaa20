//! CLI module for SplitX
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::container::DefaultAppContainer;
use crate::config_initialization::initialize_configuration_hierarchy;
use crate::domain::errors::DomainError;
use crate::error::SplitXError;
use crate::utils::logging::LoggingConfig;

pub mod args;
pub mod commands;

/// Exit code for a run where some segments failed
pub const EXIT_PARTIAL_FAILURE: i32 = 1;

/// Exit code for a cancelled run
pub const EXIT_ABORTED: i32 = 130;

/// SplitX video splitter
///
/// Marks segments on a video and writes each one to its own file through
/// ffmpeg, optionally cropping every segment to the same rectangle.
#[derive(Parser, Debug)]
#[command(name = "splitter")]
#[command(about = "SplitX - Split a video into named segments with an optional crop")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Configuration file
    #[arg(long, global = true, env = "SPLITX_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show frame size, duration and file size of a video
    Inspect(args::InspectArgs),
    /// Print the segments, output files and encoder commands without running them
    Plan(args::SplitArgs),
    /// Cut every segment into its own file
    Split(args::SplitArgs),
    /// Report the encoder version
    Check,
}

/// Resolve configuration, start logging and run the selected command.
/// Returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
    let resolved = initialize_configuration_hierarchy(&cli)?;

    LoggingConfig {
        level: resolved.config.log_level,
        format: resolved.config.log_format,
        ..LoggingConfig::default()
    }
    .init()?;

    info!("Starting SplitX {}", env!("CARGO_PKG_VERSION"));
    resolved.log_sources();
    let config = resolved.config;
    let container = DefaultAppContainer::new(&config);

    match &cli.command {
        Commands::Inspect(args) => commands::inspect(&container, args).await,
        Commands::Plan(args) => commands::plan(&container, args, &config).await,
        Commands::Split(args) => commands::split(&container, args, &config).await,
        Commands::Check => commands::check(&container).await,
    }
}

/// Exit code for an error that ended the process
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    if let Some(error) = error.downcast_ref::<SplitXError>() {
        return error.exit_code();
    }
    if let Some(error) = error.downcast_ref::<DomainError>() {
        return SplitXError::from(error.clone()).exit_code();
    }
    2
}
