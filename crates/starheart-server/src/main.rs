//! Star's Heart server - HTTP API for story session progress.

use anyhow::Result;
use clap::Parser;
use starheart_server::{app, config::Config, logging, state::AppState, sweeper};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use logging::{LogConfig, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "starheart-server")]
#[command(about = "Session progress API for The Star's Heart")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override database path from config
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Enable verbose logging (INFO level for all targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "store=debug").
    /// Targets are prefixed with "starheart::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::info!(
        target: "starheart::startup",
        "Loaded configuration (port: {}, db: {}, progression: {:?})",
        config.port,
        config.db_path.display(),
        config.progression
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = Arc::new(AppState::new(config)?);
    tracing::info!(
        target: "starheart::startup",
        "Opened progress store with {} sessions",
        state.service.store().count()?
    );

    sweeper::spawn_retention_sweeper(state.clone());

    let app = app::router(state);

    tracing::info!(target: "starheart::startup", "Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
