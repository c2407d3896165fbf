//! The kiosk activity monitor.
//!
//! One loop multiplexes every input-device stream against a one-second
//! tick. Motion events feed the idle clock and the published activity
//! state; key events feed the hotkey detector; the tick drives config
//! hot reload and idle evaluation, so the daemon makes progress even
//! with no events pending.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use evdev::{EventType, InputEvent, KeyCode};
use futures_util::StreamExt;
use futures_util::stream::{BoxStream, SelectAll};
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::{Config, ConfigWatcher};
use crate::devices::InputSource;
use crate::hotkey::HotkeyDetector;
use crate::idle::IdleClock;
use crate::paths::Paths;
use crate::reset::ResetOrchestrator;
use crate::services;
use crate::state::StatePublisher;

/// Bounded wait per loop iteration; also the config poll cadence.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// What the loop should do after an input event.
#[derive(Debug, PartialEq, Eq)]
enum LoopControl {
    Continue,
    /// The maintenance chord fired.
    Shutdown,
}

pub struct Monitor {
    streams: SelectAll<BoxStream<'static, InputEvent>>,
    watcher: ConfigWatcher,
    publisher: StatePublisher,
    hotkey: HotkeyDetector,
    clock: IdleClock,
    reset: ResetOrchestrator,
    /// Last state written to the state file; transitions publish.
    published_active: bool,
    resets_performed: u64,
    dry_run: bool,
}

impl Monitor {
    pub fn new(
        sources: Vec<InputSource>,
        config: Config,
        paths: &Paths,
        target_process: &str,
        dry_run: bool,
    ) -> Self {
        let mut streams = SelectAll::new();
        for source in sources {
            if let Some(stream) = source.into_stream() {
                streams.push(stream);
            }
        }

        Self {
            streams,
            watcher: ConfigWatcher::new(paths.config_file.clone()),
            publisher: StatePublisher::new(paths.state_file.clone()),
            hotkey: HotkeyDetector::new(),
            clock: IdleClock::new(config.idle_timeout, Instant::now()),
            reset: ResetOrchestrator::new(
                paths.reset_script.clone(),
                target_process.to_string(),
                Duration::from_secs(config.recovery_wait),
                dry_run,
            ),
            published_active: false,
            resets_performed: 0,
            dry_run,
        }
    }

    /// Run until the maintenance chord fires or a termination signal
    /// arrives.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Monitoring {} input devices - idle timeout = {}s",
            self.streams.len(),
            self.clock.timeout_secs()
        );

        self.publisher.publish(true);
        self.published_active = true;

        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        let mut sigint =
            signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(event) = self.streams.next(), if !self.streams.is_empty() => {
                    if self.handle_event(&event, Instant::now()) == LoopControl::Shutdown {
                        info!("ALT+F4 detected - stopping all kiosk services for maintenance");
                        services::stop_all(self.dry_run).await;
                        return Ok(());
                    }
                }

                _ = tick.tick() => {
                    self.on_tick(Instant::now()).await;
                }

                _ = sigterm.recv() => {
                    info!("SIGTERM received, exiting");
                    return Ok(());
                }

                _ = sigint.recv() => {
                    info!("SIGINT received, exiting");
                    return Ok(());
                }
            }
        }
    }

    /// Classify one input event.
    ///
    /// Motion (relative or absolute) counts as presence. Key events go
    /// to the hotkey detector only: typing into a locked-down kiosk
    /// does not count as use, so the idle clock is untouched.
    fn handle_event(&mut self, event: &InputEvent, now: Instant) -> LoopControl {
        match event.event_type() {
            EventType::KEY => {
                if self.hotkey.on_key(KeyCode::new(event.code()), event.value()) {
                    return LoopControl::Shutdown;
                }
            }
            EventType::RELATIVE | EventType::ABSOLUTE => {
                self.clock.touch(now);
                if !self.published_active {
                    debug!("Activity resumed");
                    self.publisher.publish(true);
                    self.published_active = true;
                }
            }
            _ => {}
        }
        LoopControl::Continue
    }

    /// One bounded-wait cycle: re-check the configuration, then the
    /// idle condition. The reset runs synchronously - while it is in
    /// flight no events are classified, which is fine because an idle
    /// kiosk produces none.
    async fn on_tick(&mut self, now: Instant) {
        if let Some(config) = self.watcher.check() {
            self.clock.set_timeout(config.idle_timeout);
            self.reset
                .set_recovery_wait(Duration::from_secs(config.recovery_wait));
            info!(
                "Config reloaded - new idle timeout = {}s",
                config.idle_timeout
            );
        }

        if self.clock.is_expired(now) {
            info!(
                "Idle for {}s - restarting kiosk session",
                self.clock.timeout_secs()
            );
            self.publisher.publish(false);
            self.published_active = false;

            let started = Instant::now();
            self.reset.perform().await;
            self.resets_performed += 1;

            // The idle clock restarts only once the reset attempt is
            // over, however long recovery took.
            self.clock.touch(now + started.elapsed());
        }
    }
}
