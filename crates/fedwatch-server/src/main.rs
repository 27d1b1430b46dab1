//! # fedwatch
//!
//! Main binary:
//! - logs in to the configured homeserver
//! - every `interval`, checks the federation endpoint of every server taking
//!   part in every joined room
//! - posts one report per room to the log room
//!
//! Ctrl-C / SIGTERM stops the wait between sweeps immediately and lets a sweep
//! in progress finish its current room.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fedwatch_federation::{DelegationResolver, HttpProber};
use fedwatch_matrix::{Homeserver, MatrixClient};
use fedwatch_monitor::{RoomSweeper, Scheduler};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "fedwatch", version, about = "Federation reachability monitor for Matrix rooms")]
struct Cli {
    /// Config file (default: config.{yaml,toml,json} in the working directory).
    #[arg(short, long, env = "FEDWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single sweep of every joined room, then exit.
    #[arg(long)]
    once: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing (structured logging)
    init_tracing(cli.json_logs);

    tracing::info!("🚀 Starting fedwatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(
        fedwatch_common::config::load(cli.config.as_deref())
            .context("Failed to load configuration")?,
    );
    tracing::info!(
        "   Homeserver: {}, user: {}, log room: {}",
        config.matrix.server_name,
        config.matrix.username,
        config.matrix.log_room
    );
    tracing::info!(
        "   Interval: {}s, probe timeout: {}s, concurrency: {}",
        config.monitor.interval_secs,
        config.monitor.probe_timeout_secs,
        config.monitor.concurrency
    );

    // === Messaging ===
    let client = MatrixClient::login(
        &config.matrix.server_name,
        &config.matrix.username,
        &config.matrix.password,
    )
    .await
    .context("Failed to log in")?;
    let homeserver: Arc<dyn Homeserver> = Arc::new(client);

    // === Federation checks ===
    let resolver = Arc::new(DelegationResolver::from_network(config.monitor.lookup_timeout())?);
    let prober = Arc::new(HttpProber::new(config.monitor.probe_timeout())?);

    let sweeper = RoomSweeper::new(config.clone(), homeserver.clone(), resolver, prober);
    let scheduler = Scheduler::new(config.clone(), homeserver, sweeper);
    let shutdown = CancellationToken::new();

    if cli.once {
        let summary = scheduler.sweep_all(&shutdown).await?;
        tracing::info!(
            "Single sweep done: {} room(s) swept, {} with failures, {} skipped",
            summary.rooms_swept,
            summary.rooms_with_failures,
            summary.rooms_skipped
        );
        return Ok(());
    }

    tokio::spawn(cancel_on_signal(shutdown.clone()));
    scheduler.run(shutdown).await;

    tracing::info!("👋 fedwatch stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fedwatch=info".into());
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
    }
}

async fn cancel_on_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}
