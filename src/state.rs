//! The shared activity state file read by the tab cycler.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Cross-process activity signal, last-writer-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskState {
    pub active: bool,
    /// Seconds since the epoch at the time of writing.
    pub timestamp: f64,
}

impl KioskState {
    /// Snapshot the given activity state at the current wall clock.
    pub fn now(active: bool) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        Self { active, timestamp }
    }

    /// Fail-safe read: a missing or unparsable file reads as idle.
    pub fn read_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }
}

impl Default for KioskState {
    fn default() -> Self {
        Self {
            active: false,
            timestamp: 0.0,
        }
    }
}

/// Writes the state file on every activity transition.
pub struct StatePublisher {
    path: PathBuf,
}

impl StatePublisher {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the state file. Best-effort: a write failure is logged
    /// and never affects the in-memory idle determination.
    pub fn publish(&self, active: bool) {
        match self.write_atomic(&KioskState::now(active)) {
            Ok(()) => debug!("Published state active={}", active),
            Err(e) => warn!("Error writing state file {}: {}", self.path.display(), e),
        }
    }

    /// A concurrent reader must never observe a torn document, so the
    /// document lands via a sibling temp file and a rename.
    fn write_atomic(&self, state: &KioskState) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
