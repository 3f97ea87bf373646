//! packetlens-cli entry point
//!
//! Parses arguments, initializes logging and dispatches to the
//! subcommand handlers in [`commands`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;

use packetlens_core::config::{GeneralConfig, PacketlensConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let general = load_general(&cli.config).await;
    logging::init_tracing(&general, cli.log_level.as_deref())?;

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Capture(args) => commands::capture::execute(args, &cli.config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

/// Resolve the `[general]` section before the subscriber comes up.
///
/// A missing or unreadable config file falls back to defaults here so
/// logging always initializes; the command handlers load the config
/// themselves and report the actual load error with full context.
/// Only the parse step runs — a `[capture]` validation problem must not
/// change how `[general]` logging behaves.
async fn load_general(config_path: &Path) -> GeneralConfig {
    let mut config = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => PacketlensConfig::parse(&content).unwrap_or_default(),
        Err(_) => PacketlensConfig::default(),
    };
    config.apply_env_overrides();
    config.general
}
