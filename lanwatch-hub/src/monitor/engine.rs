//! Composition root for the connectivity engine.
//!
//! Owns every [`Device`] behind its own mutex, keyed by the registry key.
//! The registry itself (which keys exist) is fixed at construction and never
//! changes, so lookups take no lock; only the per-device record is guarded.
//! Two events for different devices never contend, and the whole sequence
//! {journal append, transition, classification} for one device runs as a
//! single atomic unit, so concurrent drops cannot both observe a stale
//! window count.
//!
//! Delivery of an alert is the caller's job, strictly after the returned
//! [`Outcome`] leaves this module: nothing inside the critical section ever
//! blocks on I/O.

use parking_lot::Mutex;
use std::collections::HashMap;
use time::{Duration, OffsetDateTime};

use crate::api_client::types::DeviceState;
use crate::error::{Error, Result};
use crate::tracing::prelude::*;

use super::classify::{classify, Alert};
use super::config::MonitorConfig;
use super::device::Device;
use super::event::LinkEvent;

/// Result of one ingested event.
///
/// Alerts are decisions, not deliveries: a muted device still produces its
/// alert, tagged `suppressed`, and all state mutation has already happened
/// by the time the caller sees it.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The key is not in the registry. Nothing was mutated, and no device
    /// was created.
    DeviceNotFound,
    NoAction,
    Alert { alert: Alert, suppressed: bool },
}

pub struct Engine {
    config: MonitorConfig,
    devices: HashMap<String, Mutex<Device>>,
    /// Snapshot ordering follows the configured fleet order.
    order: Vec<String>,
}

impl Engine {
    pub fn new(config: MonitorConfig, fleet: impl IntoIterator<Item = Device>) -> Self {
        let mut devices = HashMap::new();
        let mut order = Vec::new();
        for device in fleet {
            order.push(device.key.clone());
            devices.insert(device.key.clone(), Mutex::new(device));
        }
        Self {
            config,
            devices,
            order,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn device_count(&self) -> usize {
        self.order.len()
    }

    /// Ingest one event, stamping "now" from the wall clock.
    pub fn ingest(&self, key: &str, event: LinkEvent) -> Outcome {
        self.ingest_at(key, event, OffsetDateTime::now_utc())
    }

    /// Ingest one event against an explicit "now" (the end of the rolling
    /// window and the mute reference point).
    ///
    /// Either fully applies the transition and returns its classification,
    /// or -- for an unknown key -- rejects with no side effect at all.
    pub fn ingest_at(&self, key: &str, event: LinkEvent, now: OffsetDateTime) -> Outcome {
        let Some(slot) = self.devices.get(key) else {
            warn!(key, "event for unregistered device rejected");
            return Outcome::DeviceNotFound;
        };

        let mut device = slot.lock();
        let transition = device.apply(event);
        debug!(key, status = %device.status, ?transition, "event applied");

        match classify(&device, &transition, now, &self.config) {
            Some(alert) => Outcome::Alert {
                suppressed: device.is_muted(now),
                alert,
            },
            None => Outcome::NoAction,
        }
    }

    /// Suppress alert delivery for `duration` starting now.
    pub fn mute(&self, key: &str, duration: Duration) -> Result<OffsetDateTime> {
        self.mute_at(key, duration, OffsetDateTime::now_utc())
    }

    /// Overwrite semantics: muting again replaces the window, it never
    /// stacks. Returns the new expiry.
    pub fn mute_at(
        &self,
        key: &str,
        duration: Duration,
        now: OffsetDateTime,
    ) -> Result<OffsetDateTime> {
        let slot = self
            .devices
            .get(key)
            .ok_or_else(|| Error::UnknownDevice(key.to_string()))?;

        let until = now + duration;
        slot.lock().muted_until = Some(until);
        info!(key, %until, "device muted");
        Ok(until)
    }

    /// Read-only copy of one device for status rendering.
    pub fn snapshot(&self, key: &str) -> Option<DeviceState> {
        self.devices
            .get(key)
            .map(|slot| DeviceState::of(&slot.lock()))
    }

    /// Read-only copies of the whole fleet, in configuration order.
    pub fn snapshot_all(&self) -> Vec<DeviceState> {
        self.order
            .iter()
            .filter_map(|key| self.snapshot(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::device::{DeviceIdentity, LinkStatus};
    use crate::monitor::event::EventKind;
    use time::macros::datetime;

    fn fleet_device(key: &str, name: &str) -> Device {
        Device::new(
            key,
            DeviceIdentity {
                name: name.into(),
                hostname: format!("{key}-host"),
                mac: "aa:bb:cc:dd:ee:ff".into(),
                icon: "📱".into(),
            },
            None,
            100,
        )
    }

    fn engine() -> Engine {
        Engine::new(
            MonitorConfig::default(),
            vec![
                fleet_device("living_room", "Speaker in the living room"),
                fleet_device("bedroom", "Speaker in the bedroom"),
                fleet_device("kitchen", "Speaker in the kitchen"),
            ],
        )
    }

    fn at(minutes: i64) -> OffsetDateTime {
        datetime!(2025-06-01 12:00 UTC) + Duration::minutes(minutes)
    }

    fn drop_event(minutes: i64) -> LinkEvent {
        LinkEvent::new(EventKind::Disconnected, at(minutes))
    }

    fn connect_event(minutes: i64) -> LinkEvent {
        LinkEvent::new(EventKind::Connected, at(minutes))
    }

    #[test]
    fn unknown_key_is_rejected_without_side_effects() {
        let engine = engine();
        let outcome = engine.ingest_at("garage", drop_event(0), at(0));

        assert_eq!(outcome, Outcome::DeviceNotFound);
        assert!(engine.snapshot("garage").is_none());
        assert_eq!(engine.device_count(), 3);
    }

    #[test]
    fn disconnect_burst_alerts_from_the_third_drop() {
        // Drops at t = 0, 10, 20, 40 min, all inside the hour window.
        let engine = engine();

        let first = engine.ingest_at("kitchen", drop_event(0), at(0));
        let second = engine.ingest_at("kitchen", drop_event(10), at(10));
        let third = engine.ingest_at("kitchen", drop_event(20), at(20));
        let fourth = engine.ingest_at("kitchen", drop_event(40), at(40));

        assert_eq!(first, Outcome::NoAction);
        assert_eq!(second, Outcome::NoAction);

        let Outcome::Alert {
            alert: Alert::FrequentDisconnect { recent: 3, .. },
            suppressed: false,
        } = third
        else {
            panic!("expected a frequency alert on the third drop, got {third:?}");
        };

        let Outcome::Alert {
            alert: Alert::FrequentDisconnect { recent: 4, .. },
            suppressed: false,
        } = fourth
        else {
            panic!("expected a frequency alert on the fourth drop, got {fourth:?}");
        };
    }

    #[test]
    fn long_offline_alerts_only_past_the_threshold() {
        let engine = engine();

        engine.ingest_at("bedroom", drop_event(0), at(0));
        let outcome = engine.ingest_at("bedroom", connect_event(5), at(5));
        let Outcome::Alert {
            alert: Alert::LongOffline { offline, .. },
            suppressed: false,
        } = outcome
        else {
            panic!("expected a long-offline alert, got {outcome:?}");
        };
        assert_eq!(offline, Duration::minutes(5));

        // Same shape, but back after one minute: silent.
        engine.ingest_at("bedroom", drop_event(10), at(10));
        let outcome = engine.ingest_at("bedroom", connect_event(11), at(11));
        assert_eq!(outcome, Outcome::NoAction);
    }

    #[test]
    fn muting_suppresses_delivery_but_not_state() {
        let engine = engine();
        engine.mute_at("kitchen", Duration::hours(1), at(0)).unwrap();

        for t in [0, 5, 10] {
            engine.ingest_at("kitchen", drop_event(t), at(t));
        }
        let outcome = engine.ingest_at("kitchen", drop_event(15), at(15));

        let Outcome::Alert {
            alert: Alert::FrequentDisconnect { recent: 4, .. },
            suppressed: true,
        } = outcome
        else {
            panic!("expected a suppressed frequency alert, got {outcome:?}");
        };

        // State tracking is unaffected by the mute.
        let state = engine.snapshot("kitchen").unwrap();
        assert_eq!(state.status, LinkStatus::Disconnected);
        assert_eq!(state.counters_24h.disconnects, 4);
    }

    #[test]
    fn mute_expires_and_overwrites() {
        let engine = engine();

        let until = engine.mute_at("kitchen", Duration::hours(1), at(0)).unwrap();
        assert_eq!(until, at(60));

        // A second mute replaces the window instead of stacking.
        let until = engine.mute_at("kitchen", Duration::minutes(5), at(1)).unwrap();
        assert_eq!(until, at(6));

        for t in [7, 8, 9] {
            // Past expiry again; third drop alerts unsuppressed.
            let outcome = engine.ingest_at("kitchen", drop_event(t), at(t));
            if t == 9 {
                let Outcome::Alert {
                    suppressed: false, ..
                } = outcome
                else {
                    panic!("expected an unsuppressed alert after mute expiry");
                };
            }
        }
    }

    #[test]
    fn mute_for_unknown_key_fails() {
        let engine = engine();
        assert!(engine.mute_at("garage", Duration::hours(1), at(0)).is_err());
    }

    #[test]
    fn snapshots_follow_configuration_order() {
        let engine = engine();
        let keys: Vec<_> = engine
            .snapshot_all()
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["living_room", "bedroom", "kitchen"]);
    }

    #[test]
    fn concurrent_ingest_loses_no_updates() {
        let engine = engine();

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    engine.ingest_at("kitchen", drop_event(0), at(0));
                });
            }
        });

        let state = engine.snapshot("kitchen").unwrap();
        assert_eq!(state.counters_24h.disconnects, 2);
        assert_eq!(state.recent_events.len(), 2);
    }

    #[test]
    fn journal_stays_bounded_under_load() {
        let config = MonitorConfig {
            max_events: 10,
            ..MonitorConfig::default()
        };
        let engine = Engine::new(config, vec![fleet_device("kitchen", "Kitchen")]);

        for t in 0..500 {
            engine.ingest_at("kitchen", drop_event(t), at(t));
        }

        let state = engine.snapshot("kitchen").unwrap();
        assert!(state.recent_events.len() <= 10);
    }
}
