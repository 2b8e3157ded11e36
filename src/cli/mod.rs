//! CLI module for docrest
//!
//! Provides command-line interface for:
//! - start: Connect every location and serve HTTP until interrupted
//! - check: Validate a configuration file and print the resolved locations

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, init_tracing, run, run_command, start, DEFAULT_LOG_FILTER};
pub use errors::{CliError, CliErrorCode, CliResult};
