//! Configuration loading, defaults, and mtime-based hot reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Fallback idle timeout in seconds (10 minutes).
pub const DEFAULT_IDLE_TIMEOUT: i64 = 600;

/// Fallback wait for the target process after a reset, in seconds.
pub const DEFAULT_RECOVERY_WAIT: u64 = 30;

/// The kiosk configuration document.
///
/// The file is a superset shared with the web manager and the tab
/// cycler; fields this daemon does not interpret (`urls`,
/// `cycle_interval`, ...) are carried in `extra` so a round-trip never
/// drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds without motion input before the kiosk session is reset.
    /// Zero or negative means "reset on every cycle".
    pub idle_timeout: i64,

    /// Seconds to wait for the target process to reappear after a reset.
    pub recovery_wait: u64,

    /// Fields owned by the sibling processes, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            recovery_wait: DEFAULT_RECOVERY_WAIT,
            extra: serde_json::Map::new(),
        }
    }
}

/// Errors that can occur loading the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// How the effective configuration came to be.
#[derive(Debug)]
pub enum LoadOutcome {
    /// File read and parsed; its values are in effect.
    Loaded,
    /// No file at the configured path; defaults are in effect.
    Missing,
    /// File present but unusable; defaults are in effect.
    UsedDefault(ConfigError),
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(config)
    }

    /// Parse-or-default constructor: never fails, reports how the
    /// effective values were obtained so the caller can log it.
    pub fn load_or_default(path: &Path) -> (Self, LoadOutcome) {
        if !path.exists() {
            return (Self::default(), LoadOutcome::Missing);
        }
        match Self::load(path) {
            Ok(config) => (config, LoadOutcome::Loaded),
            Err(e) => (Self::default(), LoadOutcome::UsedDefault(e)),
        }
    }
}

/// Source of file modification times.
///
/// Abstracted so tests can feed synthetic mtime sequences without
/// touching a real filesystem.
pub trait MtimeSource {
    fn mtime(&self, path: &Path) -> Option<SystemTime>;
}

/// The real filesystem.
pub struct FsMtime;

impl MtimeSource for FsMtime {
    fn mtime(&self, path: &Path) -> Option<SystemTime> {
        fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

/// Polls the config file's mtime and reloads on change.
pub struct ConfigWatcher<M = FsMtime> {
    path: PathBuf,
    last_seen: Option<SystemTime>,
    mtimes: M,
}

impl ConfigWatcher<FsMtime> {
    pub fn new(path: PathBuf) -> Self {
        Self::with_mtime_source(path, FsMtime)
    }
}

impl<M: MtimeSource> ConfigWatcher<M> {
    pub fn with_mtime_source(path: PathBuf, mtimes: M) -> Self {
        let last_seen = mtimes.mtime(&path);
        Self {
            path,
            last_seen,
            mtimes,
        }
    }

    /// Returns a fresh configuration when the file's mtime moved since
    /// the last check. A vanished file is "no change"; a file that
    /// changed but no longer parses is logged and skipped, keeping the
    /// previous settings in effect.
    pub fn check(&mut self) -> Option<Config> {
        let current = self.mtimes.mtime(&self.path)?;
        if self.last_seen == Some(current) {
            return None;
        }
        self.last_seen = Some(current);

        match Config::load(&self.path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Config reload failed, keeping previous settings: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Clone)]
    struct FakeMtime(Rc<Cell<Option<SystemTime>>>);

    impl FakeMtime {
        fn new() -> Self {
            Self(Rc::new(Cell::new(None)))
        }

        fn set(&self, offset_secs: u64) {
            self.0
                .set(Some(SystemTime::UNIX_EPOCH + Duration::from_secs(offset_secs)));
        }

        fn clear(&self) {
            self.0.set(None);
        }
    }

    impl MtimeSource for FakeMtime {
        fn mtime(&self, _path: &Path) -> Option<SystemTime> {
            self.0.get()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.idle_timeout, 600);
        assert_eq!(config.recovery_wait, 30);
        assert!(config.extra.is_empty());
    }

    #[test]
    fn test_parse_superset_document() {
        let raw = r#"{
            "urls": ["https://example.com/a", "https://example.com/b"],
            "cycle_interval": 90,
            "idle_timeout": 300
        }"#;

        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.idle_timeout, 300);
        assert_eq!(config.recovery_wait, 30);

        // Sibling-owned fields survive a round-trip untouched.
        assert_eq!(config.extra["cycle_interval"], 90);
        let rewritten = serde_json::to_string(&config).unwrap();
        let reparsed: Config = serde_json::from_str(&rewritten).unwrap();
        assert_eq!(reparsed.extra["urls"][1], "https://example.com/b");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let (config, outcome) = Config::load_or_default(&dir.path().join("absent.json"));
        assert_eq!(config, Config::default());
        assert!(matches!(outcome, LoadOutcome::Missing));
    }

    #[test]
    fn test_load_or_default_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiosk_config.json");
        fs::write(&path, "{not json").unwrap();

        let (config, outcome) = Config::load_or_default(&path);
        assert_eq!(config.idle_timeout, DEFAULT_IDLE_TIMEOUT);
        assert!(matches!(
            outcome,
            LoadOutcome::UsedDefault(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_or_default_wrong_field_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiosk_config.json");
        fs::write(&path, r#"{"idle_timeout": "soon"}"#).unwrap();

        let (config, outcome) = Config::load_or_default(&path);
        assert_eq!(config.idle_timeout, DEFAULT_IDLE_TIMEOUT);
        assert!(matches!(outcome, LoadOutcome::UsedDefault(_)));
    }

    #[test]
    fn test_reload_only_on_mtime_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiosk_config.json");
        fs::write(&path, r#"{"idle_timeout": 120}"#).unwrap();

        let mtimes = FakeMtime::new();
        mtimes.set(1);
        let mut watcher = ConfigWatcher::with_mtime_source(path.clone(), mtimes.clone());

        // Unchanged mtime: no reload, even if the content were rewritten.
        assert!(watcher.check().is_none());
        assert!(watcher.check().is_none());

        fs::write(&path, r#"{"idle_timeout": 30}"#).unwrap();
        mtimes.set(2);
        let reloaded = watcher.check().expect("mtime changed");
        assert_eq!(reloaded.idle_timeout, 30);

        // Same mtime again: nothing.
        assert!(watcher.check().is_none());
    }

    #[test]
    fn test_vanished_file_keeps_last_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiosk_config.json");
        fs::write(&path, r#"{"idle_timeout": 120}"#).unwrap();

        let mtimes = FakeMtime::new();
        mtimes.set(1);
        let mut watcher = ConfigWatcher::with_mtime_source(path, mtimes.clone());

        mtimes.clear();
        assert!(watcher.check().is_none());

        // File comes back with a new mtime: reload resumes.
        mtimes.set(5);
        assert!(watcher.check().is_some());
    }

    #[test]
    fn test_unparsable_reload_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiosk_config.json");
        fs::write(&path, r#"{"idle_timeout": 120}"#).unwrap();

        let mtimes = FakeMtime::new();
        mtimes.set(1);
        let mut watcher = ConfigWatcher::with_mtime_source(path.clone(), mtimes.clone());

        fs::write(&path, "{broken").unwrap();
        mtimes.set(2);
        assert!(watcher.check().is_none());

        // A later good rewrite is picked up.
        fs::write(&path, r#"{"idle_timeout": 45}"#).unwrap();
        mtimes.set(3);
        assert_eq!(watcher.check().unwrap().idle_timeout, 45);
    }

    #[test]
    fn test_file_created_after_startup_triggers_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiosk_config.json");

        let mtimes = FakeMtime::new();
        let mut watcher = ConfigWatcher::with_mtime_source(path.clone(), mtimes.clone());
        assert!(watcher.check().is_none());

        fs::write(&path, r#"{"idle_timeout": 30}"#).unwrap();
        mtimes.set(7);
        assert_eq!(watcher.check().unwrap().idle_timeout, 30);
    }
}
