//! Buildwatch daemon
//!
//! Watches a CI status snapshot and keeps a worst-case tray status.
//!
//! ## Commands
//!
//! - `run`: poll the snapshot on an interval until Ctrl-C
//! - `check`: run a single cycle and print the decision as JSON
//! - `summary`: run a single cycle and print the grouped status summary

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use buildwatch_core::{
    init_from_config, init_tracing, BuildwatchConfig, BuildwatchService, ConfigLoader, CycleRunner,
    FileSnapshotSource, IconSet, LogFormat, LogSink,
};

#[derive(Parser)]
#[command(name = "buildwatchd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CI build status tray daemon", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "BUILDWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the snapshot and update the tray until interrupted
    Run {
        /// Override the poll interval in seconds
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Run one cycle and print the aggregation result and decision
    Check,

    /// Run one cycle and print the status summary
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load config")?;
    init_logging(&cli, &config);

    let runner = build_runner(&config).await?;
    match cli.command {
        Commands::Run { interval } => run(runner, &config, interval).await,
        Commands::Check => {
            let outcome = runner.run_cycle("check").await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Commands::Summary => {
            runner.run_cycle("summary").await?;
            let summary = runner.show_status_summary().await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn init_logging(cli: &Cli, config: &BuildwatchConfig) {
    if cli.verbose || cli.json {
        let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
        init_tracing(cli.json || config.logging.format == LogFormat::Json, level);
    } else {
        init_from_config(&config.logging);
    }
}

async fn build_runner(config: &BuildwatchConfig) -> Result<Arc<CycleRunner>> {
    let snapshot = &config.snapshot_path;
    let source = Arc::new(
        FileSnapshotSource::open(snapshot)
            .await
            .with_context(|| format!("failed to open snapshot {}", snapshot.display()))?,
    );
    let sink = Arc::new(LogSink::new(
        IconSet::new(&config.icons_dir),
        config.balloon_timeout(),
    ));
    Ok(Arc::new(CycleRunner::new(source.clone(), source, sink)))
}

async fn run(
    runner: Arc<CycleRunner>,
    config: &BuildwatchConfig,
    interval: Option<u64>,
) -> Result<()> {
    let period = interval
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.poll_interval())
        .max(std::time::Duration::from_secs(1));

    let (service, handle) = BuildwatchService::new(runner);
    let service_task = tokio::spawn(service.run());

    info!(
        snapshot = %config.snapshot_path.display(),
        interval_secs = period.as_secs(),
        "buildwatchd started"
    );
    handle.configuration_changed()?;

    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately; the initial cycle is already queued.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => handle.refresh_now()?,
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("shutdown requested");
                break;
            }
        }
    }

    drop(handle);
    let batches = service_task.await.context("service task failed")?;
    info!(batches = batches, "buildwatchd stopped");
    Ok(())
}
