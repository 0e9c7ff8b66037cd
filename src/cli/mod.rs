//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Satchel using clap.

pub mod commands;
pub mod context;

use clap::{Parser, Subcommand};

/// Exit code: success
pub const EXIT_OK: i32 = 0;
/// Exit code: some forms failed or were cancelled
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: configuration error
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: remote server unreachable
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code: fatal error
pub const EXIT_FATAL: i32 = 5;

/// Satchel - form submission pull and export tool
#[derive(Parser, Debug)]
#[command(name = "satchel")]
#[command(version, about, long_about = None)]
#[command(author = "Satchel Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "satchel.toml", env = "SATCHEL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SATCHEL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Download form definitions and submissions from the remote server
    Pull(commands::pull::PullArgs),

    /// List locally stored forms
    Forms(commands::forms::FormsArgs),

    /// Set the default or a per-form export configuration
    Configure(commands::configure::ConfigureArgs),

    /// Export submissions of the selected forms
    Export(commands::export::ExportArgs),

    /// Clear the definition cache and every stored preference
    ClearPrefs(commands::clear::ClearArgs),
}
