//! kiosk-idled - idle/activity monitor for unattended web kiosks.
//!
//! Aggregates raw input-device events into an activity signal, shares it
//! with the sibling tab cycler through a small state file, resets the
//! kiosk session after the configured idle timeout, and recognizes the
//! ALT+F4 maintenance chord.

pub mod config;
pub mod devices;
pub mod hotkey;
pub mod idle;
pub mod monitor;
pub mod paths;
pub mod reset;
pub mod services;
pub mod state;
