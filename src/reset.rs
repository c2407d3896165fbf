//! Reset orchestration.
//!
//! Runs the external reset action, then polls for the target
//! application process to reappear. Both steps are best-effort: neither
//! a failed script nor a missed recovery changes subsequent control
//! flow, and the idle clock restarts unconditionally afterwards.

use std::fs;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

/// Cadence of the recovery poll.
const RECOVERY_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct ResetOrchestrator {
    script: PathBuf,
    target_process: String,
    recovery_wait: Duration,
    dry_run: bool,
}

impl ResetOrchestrator {
    pub fn new(
        script: PathBuf,
        target_process: String,
        recovery_wait: Duration,
        dry_run: bool,
    ) -> Self {
        Self {
            script,
            target_process,
            recovery_wait,
            dry_run,
        }
    }

    /// The recovery wait is hot-reloadable alongside the idle timeout.
    pub fn set_recovery_wait(&mut self, wait: Duration) {
        self.recovery_wait = wait;
    }

    /// Invoke the reset action and wait for the target process to
    /// reappear. Returns whether recovery was observed; the outcome is
    /// a log-only signal.
    pub async fn perform(&self) -> bool {
        self.run_script().await;

        if self.dry_run {
            info!(
                "[DRY RUN] Would wait up to {:?} for {}",
                self.recovery_wait, self.target_process
            );
            return false;
        }

        self.wait_for_recovery().await
    }

    async fn run_script(&self) {
        if self.dry_run {
            info!("[DRY RUN] Would execute {}", self.script.display());
            return;
        }

        let result = Command::new(&self.script)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) if status.success() => debug!("Reset script finished"),
            Ok(status) => warn!("Reset script exited with {}", status),
            Err(e) => warn!(
                "Failed to run reset script {}: {}",
                self.script.display(),
                e
            ),
        }
    }

    async fn wait_for_recovery(&self) -> bool {
        let deadline = Instant::now() + self.recovery_wait;
        loop {
            if process_running(&self.target_process) {
                info!("{} restarted successfully", self.target_process);
                return true;
            }
            if Instant::now() >= deadline {
                warn!(
                    "{} did not restart within {:?}",
                    self.target_process, self.recovery_wait
                );
                return false;
            }
            time::sleep(RECOVERY_POLL_INTERVAL).await;
        }
    }
}

/// Name-based process lookup against /proc, the only feedback signal
/// about reset efficacy. Matches a substring of the kernel-reported
/// process name, which is truncated to 15 characters.
pub fn process_running(name: &str) -> bool {
    let Ok(entries) = fs::read_dir("/proc") else {
        return false;
    };

    for entry in entries.flatten() {
        let pid = entry.file_name();
        let Some(pid) = pid.to_str() else { continue };
        if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if let Ok(comm) = fs::read_to_string(entry.path().join("comm"))
            && comm.trim_end().contains(name)
        {
            return true;
        }
    }

    false
}
