//! Input device discovery and event streams.
//!
//! Devices are enumerated once at startup; nodes appearing later are
//! not picked up. Only devices that can produce real user input (key,
//! relative or absolute motion events) are kept - LEDs, sound cards
//! and similar nodes also live under /dev/input.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use evdev::{Device, EventType, InputEvent};
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use tracing::{debug, info, warn};

/// Device node namespace scanned at startup.
pub const INPUT_DIR: &str = "/dev/input";

/// One capability-filtered input device.
pub struct InputSource {
    pub path: PathBuf,
    /// Human-readable device name, diagnostics only.
    pub name: String,
    device: Device,
}

/// Discover eligible input devices under [`INPUT_DIR`].
///
/// Unreadable or unopenable nodes are logged and skipped; an empty
/// result is valid and leaves the idle timeout as the only reset path.
pub fn enumerate() -> Vec<InputSource> {
    enumerate_in(Path::new(INPUT_DIR))
}

pub fn enumerate_in(dir: &Path) -> Vec<InputSource> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot scan {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut sources = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_name.starts_with("event") {
            continue;
        }

        let device = match Device::open(&path) {
            Ok(device) => device,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                debug!("No permission to read {}, skipping", path.display());
                continue;
            }
            Err(e) => {
                warn!("Cannot access {}: {}", path.display(), e);
                continue;
            }
        };

        let name = device.name().unwrap_or("unnamed device").to_string();
        if is_interactive(&device) {
            info!("Tracking input device: {} ({})", name, path.display());
            sources.push(InputSource { path, name, device });
        } else {
            debug!("Ignoring non-interactive device: {}", name);
        }
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    sources
}

/// A device qualifies when it advertises key, relative-motion or
/// absolute-motion events.
fn is_interactive(device: &Device) -> bool {
    let events = device.supported_events();
    events.contains(EventType::KEY)
        || events.contains(EventType::RELATIVE)
        || events.contains(EventType::ABSOLUTE)
}

impl InputSource {
    /// Convert into an event stream owned by the monitor loop.
    ///
    /// The stream ends when the device stops delivering events (e.g. it
    /// was unplugged); that is logged, never fatal.
    pub fn into_stream(self) -> Option<BoxStream<'static, InputEvent>> {
        let Self { path, name, device } = self;

        let events = match device.into_event_stream() {
            Ok(events) => events,
            Err(e) => {
                warn!("Cannot watch {} ({}): {}", name, path.display(), e);
                return None;
            }
        };

        Some(
            stream::unfold((events, name), |(mut events, name)| async move {
                match events.next_event().await {
                    Ok(event) => Some((event, (events, name))),
                    Err(e) => {
                        warn!("Input device {} stopped delivering events: {}", name, e);
                        None
                    }
                }
            })
            .boxed(),
        )
    }
}
