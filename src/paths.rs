//! Startup path resolution.
//!
//! The one place that consults the environment. Every other component
//! receives already-resolved paths from here.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use nix::unistd::User;
use tracing::debug;

/// Config document shared with the web manager and the tab cycler,
/// relative to the kiosk user's home.
pub const CONFIG_FILE_NAME: &str = "kiosk_config.json";

/// Activity state read by the tab cycler.
pub const DEFAULT_STATE_FILE: &str = "/tmp/kiosk_state.json";

/// External reset action, invoked with no arguments.
pub const DEFAULT_RESET_SCRIPT: &str = "/usr/local/bin/kiosk-reset-url.sh";

/// Effective file locations for one daemon run.
#[derive(Debug, Clone)]
pub struct Paths {
    pub config_file: PathBuf,
    pub state_file: PathBuf,
    pub reset_script: PathBuf,
}

impl Paths {
    /// Resolve the effective paths once at startup. CLI overrides win
    /// over the built-in defaults.
    pub fn resolve(
        config_file: Option<PathBuf>,
        state_file: Option<PathBuf>,
        reset_script: Option<PathBuf>,
    ) -> Result<Self> {
        let config_file = match config_file {
            Some(path) => path,
            None => kiosk_user_home()
                .context("could not determine the kiosk user's home directory")?
                .join(CONFIG_FILE_NAME),
        };

        Ok(Self {
            config_file,
            state_file: state_file.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            reset_script: reset_script.unwrap_or_else(|| PathBuf::from(DEFAULT_RESET_SCRIPT)),
        })
    }
}

/// Home directory of the user owning the kiosk session. Under sudo that
/// is the invoking user, not root.
fn kiosk_user_home() -> Option<PathBuf> {
    for var in ["SUDO_USER", "USER"] {
        if let Ok(name) = env::var(var)
            && let Ok(Some(user)) = User::from_name(&name)
        {
            debug!("Resolved kiosk user '{}' from ${}", name, var);
            return Some(user.dir);
        }
    }
    dirs::home_dir()
}
