//! carbond — the CarbonGrid daemon.
//!
//! Two subcommands:
//!
//! - **poller** — long-lived carbon intensity cache loop: poll the
//!   emissions service, persist ranked snapshots atomically
//! - **sim** — replay synthetic workloads against a snapshot under all
//!   five placement policies and print a comparison report
//!
//! The placement engine itself ships as a library
//! (`carbongrid-scheduler`); the platform adapter that feeds it is an
//! external collaborator.
//!
//! # Usage
//!
//! ```text
//! carbond poller
//! carbond sim /cache/carbon_cache.json 1.0 5.0 0.4
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::error;

use carbongrid_cache::{CacheConfig, EmissionsClient, Poller, DEFAULT_BASE_URL};
use carbongrid_core::read_snapshot;
use carbongrid_sim::{render, run_all, SimConfig};

#[derive(Parser)]
#[command(name = "carbond", about = "Carbon-aware placement daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the carbon intensity cache poller.
    Poller {
        /// Base URL of the emissions service.
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },

    /// Replay synthetic workloads against a snapshot and print metrics.
    Sim {
        /// Path to the carbon snapshot file.
        snapshot: PathBuf,

        /// Simulated duration in hours.
        #[arg(default_value_t = 1.0)]
        duration_hours: f64,

        /// Mean arrival rate in units per minute.
        #[arg(default_value_t = 5.0)]
        arrivals_per_minute: f64,

        /// Fraction of compute-intensive units (0.0-1.0).
        #[arg(default_value_t = 0.4)]
        compute_ratio: f64,

        /// Seed for the workload streams.
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,carbond=debug,carbongrid=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Poller { base_url } => run_poller(base_url).await,
        Command::Sim {
            snapshot,
            duration_hours,
            arrivals_per_minute,
            compute_ratio,
            seed,
        } => run_sim(
            snapshot,
            duration_hours,
            arrivals_per_minute,
            compute_ratio,
            seed,
        ),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "carbond failed");
            ExitCode::FAILURE
        }
    }
}

async fn run_poller(base_url: String) -> anyhow::Result<()> {
    let config = CacheConfig::from_env()?;
    let client = EmissionsClient::new(base_url, &config.api_key)?;
    let poller = Poller::new(client, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    poller.run(shutdown_rx).await;
    Ok(())
}

fn run_sim(
    snapshot_path: PathBuf,
    duration_hours: f64,
    arrivals_per_minute: f64,
    compute_ratio: f64,
    seed: u64,
) -> anyhow::Result<()> {
    // Saved snapshots are usually older than their TTL; the replay
    // doesn't care about freshness, only the recorded intensities.
    let snapshot = read_snapshot(&snapshot_path)
        .with_context(|| format!("unreadable snapshot: {}", snapshot_path.display()))?;

    let config = SimConfig::new(duration_hours, arrivals_per_minute, compute_ratio, seed);
    let runs = run_all(&snapshot, &config);
    print!("{}", render(&runs));
    Ok(())
}
