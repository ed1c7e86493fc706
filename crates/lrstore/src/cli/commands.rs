//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Host to bind to (overrides configuration)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides configuration)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// User directory commands.
#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// Add a user to the directory
    Add {
        /// Unique login name
        username: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: Option<String>,

        /// Mobile number
        #[arg(short, long)]
        mobile: Option<String>,

        /// Role within the office
        #[arg(short, long)]
        role: Option<String>,
    },

    /// List all users
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
