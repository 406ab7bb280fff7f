//! Command-line interface for safestep
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Crosswalk announcement aid
#[derive(Parser, Debug)]
#[command(name = "safestep", version, about = "Crosswalk announcement aid")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-tick events)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Detection service endpoint
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Poll interval (default: 1s). Examples: 500ms, 2s
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub interval: Option<u64>,

    /// Suppression window between repeat announcements (default: 5s)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub suppression: Option<u64>,

    /// Announcement message override
    #[arg(long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Print announcements to stdout instead of speaking
    #[arg(long)]
    pub no_speech: bool,

    /// Skip camera acquisition
    #[arg(long)]
    pub no_camera: bool,

    /// Camera device path (e.g. /dev/video0)
    #[arg(long, value_name = "DEVICE")]
    pub camera: Option<String>,
}

/// Parse a duration string into milliseconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (milliseconds), single-unit (`500ms`, `2s`), and compound (`1m30s`).
fn parse_duration_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    // Bare number → milliseconds
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the detection endpoint and camera, then exit
    Check,

    /// Speak a message once and exit (speech output test)
    Say {
        /// Message to speak (default: the configured announcement)
        text: Option<String>,
    },

    /// Inspect configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
