//! Best-effort shutdown of the kiosk service units.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{info, warn};

/// Units stopped by the maintenance chord. Stopping this daemon's own
/// unit comes last so the other stops are always attempted.
pub const KIOSK_SERVICES: [&str; 3] = [
    "kiosk.service",
    "kiosk-tab-cycler.service",
    "kiosk-idled.service",
];

/// Stop every kiosk unit. Each stop is attempted independently; a
/// failure is logged and does not abort the remaining stops.
pub async fn stop_all(dry_run: bool) {
    for service in KIOSK_SERVICES {
        if dry_run {
            info!("[DRY RUN] Would stop {}", service);
            continue;
        }

        let result = Command::new("systemctl")
            .args(["stop", service])
            .stdin(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) if status.success() => info!("Stopped {}", service),
            Ok(status) => warn!("systemctl stop {} exited with {}", service, status),
            Err(e) => warn!("Error stopping {}: {}", service, e),
        }
    }
}
