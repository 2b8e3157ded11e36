//! CLI command implementations
//!
//! `start` follows a fixed boot sequence: logging, configuration, backend,
//! connection registry, HTTP server. A failure at any step aborts the
//! process before the server binds.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::GatewayConfig;
use crate::connection::{ConnectionRegistry, DriverFactory};
use crate::driver::{Driver, MemoryCluster, MemorySeed};
use crate::gateway::HttpServer;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,docrest=debug";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Start { config } => start(&config),
        Command::Check { config } => check(&config),
    }
}

/// Install the global tracing subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}

/// Validate a configuration file and print what it resolves to
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = GatewayConfig::load(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config_summary(&config))?);
    Ok(())
}

/// Resolved configuration as printed by `check`
fn config_summary(config: &GatewayConfig) -> serde_json::Value {
    let backoff_ms = u64::try_from(config.reconnect_backoff.as_millis()).unwrap_or(u64::MAX);
    json!({
        "http": config.http,
        "reconnect_backoff_ms": backoff_ms,
        "client_body_buffer_size": config.client_body_buffer_size,
        "memory_seed": config.memory_seed,
        "locations": config.locations,
    })
}

/// Boot the gateway and serve until Ctrl-C
pub fn start(config_path: &Path) -> CliResult<()> {
    init_tracing();
    tracing::info!(
        version = crate::VERSION,
        config = %config_path.display(),
        "starting docrest"
    );

    let config = GatewayConfig::load(config_path)?;
    let cluster = open_backend(&config)?;

    let factory: Box<DriverFactory> = {
        let cluster = Arc::clone(&cluster);
        Box::new(move || Box::new(cluster.session()) as Box<dyn Driver>)
    };
    let registry = Arc::new(ConnectionRegistry::init(&config.locations, &factory)?);

    let server = HttpServer::new(&config, Arc::clone(&registry));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;

    let served = rt.block_on(async {
        server
            .start_with_shutdown(shutdown_signal())
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    });

    registry.shutdown();
    served
}

/// In-process backend, seeded if the configuration names a seed file
fn open_backend(config: &GatewayConfig) -> CliResult<Arc<MemoryCluster>> {
    match &config.memory_seed {
        Some(path) => {
            let cluster = MemorySeed::load(path)?.into_cluster()?;
            tracing::info!(seed = %path.display(), "memory backend seeded");
            Ok(cluster)
        }
        None => {
            tracing::warn!("no memory_seed configured, starting with an empty backend");
            Ok(MemoryCluster::new())
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
