//! Lifeline CLI - Diagnostics for the Lifeline telemetry bridge
//!
//! Provides commands for:
//! - Inspecting, adding, flushing and clearing cached crash reports
//! - Printing the environment snapshot, device id and constants table
//! - Replaying lifecycle signal scripts through the session observer

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lifeline_bridge::{
    clock, Bridge, BridgeContext, ManualLifecycleSource, RecordingCrashClient, RecordingSink,
};
use lifeline_core::config::Config;
use lifeline_telemetry::{install_panic_reporter, FileKeyValueStore, LocalEnvironment};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    constants::ConstantsCommand, device_id::DeviceIdCommand, env::EnvCommand,
    replay::ReplayCommand, reports::ReportsCommand, CliContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "lifeline", version, about = "Crash report cache and session diagnostics")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use alternate report cache directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage cached crash reports
    #[command(subcommand)]
    Reports(ReportsCommand),
    /// Show the environment snapshot attached to reports
    Env(EnvCommand),
    /// Print the stable device identifier
    DeviceId(DeviceIdCommand),
    /// Print the constants table handed to event consumers
    Constants(ConstantsCommand),
    /// Replay a lifecycle signal script and print the derived events
    Replay(ReplayCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    clock::mark_process_start();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        Config::default()
    };

    // Setup tracing
    let filter = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    for problem in config.validate() {
        // The CLI never talks to the collector, so only log
        debug!(field = %problem.field, "Config: {}", problem.message);
    }

    let dir = cli.dir.clone().unwrap_or_else(|| config.cache.dir.clone());
    let environment = Arc::new(LocalEnvironment::collect());
    let context = BridgeContext::new(
        Arc::new(FileKeyValueStore::new(&dir)),
        Arc::new(RecordingCrashClient::new()),
        Arc::new(RecordingSink::new()),
        Arc::new(ManualLifecycleSource::new()),
    )
    .with_environment(environment.clone())
    .with_config(&config);
    let bridge = Bridge::new(context)?;

    if config.crash_reporting.enabled {
        install_panic_reporter(
            Arc::clone(bridge.report_store()),
            env!("CARGO_PKG_VERSION").to_string(),
            environment,
        );
    } else {
        warn!("Crash reporting disabled; panics will not be cached");
    }

    let ctx = CliContext {
        config,
        dir,
        bridge,
    };
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match cli.command {
        Commands::Reports(cmd) => cmd.execute(&ctx, format).await,
        Commands::Env(cmd) => cmd.execute(&ctx, format).await,
        Commands::DeviceId(cmd) => cmd.execute(&ctx, format).await,
        Commands::Constants(cmd) => cmd.execute(&ctx, format).await,
        Commands::Replay(cmd) => cmd.execute(&ctx, format).await,
    }
}
