//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the exporter using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// permit-export - Building-permit submission exporter for Bluebeam Studio
#[derive(Parser, Debug)]
#[command(name = "permit-export")]
#[command(version, about, long_about = None)]
#[command(author = "permit-export contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "permit-export.toml", env = "PERMIT_EXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PERMIT_EXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export pending submissions to Bluebeam
    Export(commands::export::ExportArgs),

    /// Store a submission payload for the next export
    Submit(commands::submit::SubmitArgs),

    /// Show pending work or the result of an export
    Status(commands::status::StatusArgs),

    /// Exchange an authorization code for a stored credential
    Authorize(commands::authorize::AuthorizeArgs),

    /// Print the Bluebeam authorization page URL
    AuthorizeUrl(commands::authorize::AuthorizeUrlArgs),

    /// Manage users granted access to new projects
    Users(commands::users::UsersArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
