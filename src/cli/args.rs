//! CLI argument definitions using clap
//!
//! Commands:
//! - docrest start --config <path>
//! - docrest check --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docrest - REST gateway for a document database
#[derive(Parser, Debug)]
#[command(name = "docrest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect every configured location and serve HTTP
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./docrest.json")]
        config: PathBuf,
    },

    /// Validate the configuration and print the resolved locations
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./docrest.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
