//! kiosk-idled - idle/activity monitor for unattended web kiosks.
//!
//! Watches raw input devices, publishes the shared activity state for
//! the tab cycler, and resets the kiosk session after the configured
//! idle timeout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kiosk_idled::config::{Config, LoadOutcome};
use kiosk_idled::devices;
use kiosk_idled::monitor::Monitor;
use kiosk_idled::paths::Paths;

/// Kiosk idle-reset daemon.
///
/// Aggregates input-device events into an activity signal, resets the
/// kiosk after the configured idle timeout, and recognizes ALT+F4 as
/// the maintenance escape hatch.
#[derive(Parser, Debug)]
#[command(name = "kiosk-idled")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the kiosk config file (default: the kiosk user's
    /// ~/kiosk_config.json).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path of the shared state file read by the tab cycler.
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Reset action executed when the idle timeout expires.
    #[arg(long)]
    reset_script: Option<PathBuf>,

    /// Process name confirming the kiosk session recovered after a reset.
    #[arg(long, default_value = "chromium")]
    target_process: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log resets and service stops instead of executing them.
    #[arg(long)]
    dry_run: bool,

    /// Enumerate eligible input devices and exit.
    #[arg(long)]
    list_devices: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level)?;

    info!("kiosk-idled v{} starting", env!("CARGO_PKG_VERSION"));

    if args.list_devices {
        return list_devices();
    }

    let paths = Paths::resolve(args.config, args.state_file, args.reset_script)
        .context("Failed to resolve runtime paths")?;

    let (config, outcome) = Config::load_or_default(&paths.config_file);
    match outcome {
        LoadOutcome::Loaded => info!(
            "Configuration loaded from {} (idle timeout = {}s)",
            paths.config_file.display(),
            config.idle_timeout
        ),
        LoadOutcome::Missing => info!(
            "No config at {}, using defaults (idle timeout = {}s)",
            paths.config_file.display(),
            config.idle_timeout
        ),
        LoadOutcome::UsedDefault(e) => warn!("Error loading config: {} - using defaults", e),
    }

    let sources = devices::enumerate();
    if sources.is_empty() {
        warn!("No eligible input devices found; idle timeout is the only reset path");
    }

    Monitor::new(sources, config, &paths, &args.target_process, args.dry_run)
        .run()
        .await
}

/// Initialize logging with the specified level.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(format!("kiosk_idled={}", level))
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Invalid log level")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    Ok(())
}

/// Oneshot mode: print what the enumerator would track, then exit.
fn list_devices() -> Result<()> {
    let sources = devices::enumerate();
    if sources.is_empty() {
        println!("no eligible input devices");
        return Ok(());
    }

    for source in &sources {
        println!("{}\t{}", source.path.display(), source.name);
    }
    Ok(())
}
