//! vscaled — the vscale daemon.
//!
//! Assembles the autoscaler for one game server:
//! - rules file (TOML)
//! - Prometheus metrics source
//! - RCON console for draining the game server
//! - Hetzner Cloud provider for stop / resize / power-on
//! - scheduler (rules interval loop + cron entries)
//!
//! # Usage
//!
//! ```text
//! vscaled --rules-file rules.toml --allowed-sizes cx22,cx32,cx42 \
//!         --hetzner-server-name mc --metrics-address http://prometheus:9090 \
//!         --rcon-address mc:25575
//! ```
//!
//! Every flag can also be set through its environment variable
//! (`RULES_FILE`, `ALLOWED_SIZES`, `HETZNER_API_KEY`, ...), including from
//! a `.env` file in the working directory.

mod config;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vscale_autoscale::{
    BroadcastMessage, DecisionEngine, DrainCoordinator, DrainOptions, ListResponseParser,
    ResizeCoordinator, ResizeOptions, ScalingOrchestrator, Scheduler,
};
use vscale_core::{RulesFile, ShutdownSignal};
use vscale_hcloud::{HcloudOptions, HcloudProvider};
use vscale_metrics::PrometheusClient;
use vscale_rcon::RconConnector;

use config::Args;

const METRICS_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = config::load_env_file(Path::new(".env"));
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match env_file {
        Ok(true) => info!("loaded .env"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env"),
    }

    run(args).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    info!("vscaled starting");

    let rules = RulesFile::from_file(&args.rules_file)
        .with_context(|| format!("failed to load rules file {}", args.rules_file.display()))?;
    info!(
        rules = rules.rules.len(),
        schedules = rules.schedule.len(),
        "rules loaded"
    );

    // ── Collaborators ──────────────────────────────────────────

    let metrics = PrometheusClient::new(
        &args.metrics_address,
        &args.metrics_username,
        &args.metrics_password,
        METRICS_QUERY_TIMEOUT,
    )
    .context("failed to create prometheus client")?;

    let provider = HcloudProvider::connect(
        &args.hetzner_api_key,
        &args.hetzner_server_name,
        HcloudOptions {
            server_types_cache_lifetime: args.hetzner_server_types_cache_time,
            ..HcloudOptions::default()
        },
    )
    .await
    .with_context(|| format!("failed to locate server {:?}", args.hetzner_server_name))?;

    let console = RconConnector::new(&args.rcon_address, &args.rcon_password, args.rcon_timeout);
    let parser = ListResponseParser::new().context("failed to build list response parser")?;

    // ── Autoscaler ─────────────────────────────────────────────

    let allowed = args.allowed_sizes();
    info!(allowed = ?allowed, "allowed sizes");

    let drain = DrainCoordinator::new(
        Arc::new(console),
        Arc::new(parser),
        DrainOptions {
            message: BroadcastMessage::new(args.drain_message.clone()),
            ..DrainOptions::default()
        },
    );
    let resize = ResizeCoordinator::new(Arc::new(provider), allowed, ResizeOptions::default());
    let orchestrator = Arc::new(ScalingOrchestrator::new(
        drain,
        resize,
        args.min_time_between_scale,
    ));
    let engine = Arc::new(DecisionEngine::new(Arc::new(metrics)));
    let scheduler = Scheduler::new(orchestrator, engine, rules, args.interval);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_handle = tokio::spawn(scheduler.run(ShutdownSignal::new(shutdown_rx)));

    tokio::signal::ctrl_c()
        .await
        .context("failed to install CTRL+C handler")?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    scheduler_handle.await.context("scheduler task failed")?;

    info!("vscaled stopped");
    Ok(())
}
