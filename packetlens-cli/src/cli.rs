//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Packetlens -- packet capture, classification and traffic reporting.
///
/// Use `packetlens <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "packetlens", version, about, long_about = None)]
pub struct Cli {
    /// Path to the packetlens.toml configuration file.
    #[arg(short, long, default_value = "packetlens.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a capture session over a packet trace and report on it.
    Capture(CaptureArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- capture ----

/// Capture session stop-condition profiles.
///
/// Each profile bundles a packet count limit with a session time limit.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Profile {
    /// 10 packets or 20 seconds.
    Simple,
    /// 20 packets or 30 seconds (default).
    Advanced,
    /// 30 packets or 40 seconds.
    Visual,
}

/// Run a capture session over a JSONL packet trace.
#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Packet trace to replay (one JSON packet descriptor per line).
    pub input: PathBuf,

    /// Stop-condition profile. Defaults to the configured limits.
    #[arg(long)]
    pub profile: Option<Profile>,

    /// Override the packet count limit.
    #[arg(long)]
    pub max_packets: Option<u64>,

    /// Override the session time limit in seconds.
    #[arg(long)]
    pub max_duration_secs: Option<u64>,

    /// Override the CSV export path.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Skip the CSV export.
    #[arg(long)]
    pub no_csv: bool,

    /// Suppress per-packet progress lines.
    #[arg(short, long)]
    pub quiet: bool,
}

// ---- config ----

/// Manage packetlens configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, capture, export).
        #[arg(long)]
        section: Option<String>,
    },
}
