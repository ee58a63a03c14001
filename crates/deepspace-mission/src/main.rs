//! deepspace-mission command-line entry point.
//!
//! Loads the mission configuration, applies command-line overrides, and runs
//! one mission on a blocking task of the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  ├─ Cli::parse()            -- flags and DEEPSPACE_* environment variables
//!  ├─ load_config()           -- TOML file, defaults when absent
//!  ├─ Ctrl-C handler          -- cancels the mission token
//!  └─ spawn_blocking(run_mission)
//!       ├─ headquarters threads
//!       └─ explorer threads
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use deepspace_core::{CancellationToken, Sha256Transform};
use deepspace_mission::infrastructure::mission::run_mission;
use deepspace_mission::infrastructure::storage::config::{load_config, save_config, MissionConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Runs a headquarters/explorer decoding mission.
///
/// Values given on the command line (or through their environment variable)
/// override the configuration file.
#[derive(Debug, Parser)]
#[command(
    name = "deepspace-mission",
    about = "Pair headquarters work items with explorer threads and decode them",
    version
)]
struct Cli {
    /// Path to the TOML configuration file.  A missing file means defaults.
    #[arg(long, default_value = "deepspace.toml", env = "DEEPSPACE_CONFIG")]
    config: PathBuf,

    /// Number of explorer threads.
    #[arg(long, env = "DEEPSPACE_EXPLORERS")]
    explorers: Option<usize>,

    /// Number of headquarters threads.
    #[arg(long, env = "DEEPSPACE_HEADQUARTERS")]
    headquarters: Option<usize>,

    /// SHA-256 rounds applied to every work payload.
    #[arg(long, env = "DEEPSPACE_HASH_ITERATIONS")]
    hash_iterations: Option<u32>,

    /// Number of systems in the mission plan.
    #[arg(long, env = "DEEPSPACE_SYSTEMS")]
    systems: Option<u32>,

    /// Write the effective configuration to `--config` and exit.
    #[arg(long)]
    write_default_config: bool,
}

impl Cli {
    fn apply_overrides(&self, cfg: &mut MissionConfig) {
        if let Some(threads) = self.explorers {
            cfg.explorers.threads = threads;
        }
        if let Some(threads) = self.headquarters {
            cfg.headquarters.threads = threads;
        }
        if let Some(rounds) = self.hash_iterations {
            cfg.explorers.hash_iterations = rounds;
        }
        if let Some(systems) = self.systems {
            cfg.mission.systems = systems;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = load_config(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;
    cli.apply_overrides(&mut cfg);

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cfg.logging.level)),
        )
        .init();

    if cli.write_default_config {
        save_config(&cli.config, &cfg)
            .with_context(|| format!("failed to write config to {}", cli.config.display()))?;
        info!("configuration written to {}", cli.config.display());
        return Ok(());
    }

    cfg.validate().context("configuration rejected")?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_token.cancel();
        }
    });

    // ── Mission ───────────────────────────────────────────────────────────────
    let report = tokio::task::spawn_blocking(move || {
        run_mission(&cfg, Arc::new(Sha256Transform), cancel)
    })
    .await
    .context("mission task panicked")?
    .context("mission failed")?;

    for discovery in report.discoveries.iter().take(5) {
        debug!(
            "system {} (from {}): {}",
            discovery.system, discovery.parent, discovery.frequency
        );
    }
    for explorer in &report.explorers {
        info!(
            "explorer {}: {} pairs decoded, {} incomplete",
            explorer.explorer, explorer.pairs_decoded, explorer.incomplete_pairs
        );
    }

    if report.is_complete() {
        info!(
            "all {} systems discovered in {:?}",
            report.planned, report.elapsed
        );
    } else {
        warn!(
            "mission stopped early: {} of {} systems discovered",
            report.discoveries.len(),
            report.planned
        );
    }
    Ok(())
}
