//! The device connectivity engine.
//!
//! Tracks per-device link state from router-reported events, keeps a bounded
//! most-recent-first journal per device, and debounces the raw event stream
//! into alerts: a burst of disconnects inside a rolling window, or a
//! reconnect after an outage long enough to matter. Single events are never
//! alert-worthy on their own.

mod classify;
mod config;
mod device;
mod engine;
mod event;
mod journal;

pub use classify::{classify, Alert, DeviceRef};
pub use config::MonitorConfig;
pub use device::{DayCounters, Device, DeviceIdentity, LinkStatus, Transition};
pub use engine::{Engine, Outcome};
pub use event::{EventKind, LinkEvent};
pub use journal::EventJournal;
