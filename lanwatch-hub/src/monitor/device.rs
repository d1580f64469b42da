//! Per-device record and the link status state machine.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;

use super::event::{EventKind, LinkEvent};
use super::journal::EventJournal;

/// Immutable identity of a configured appliance. Fixed at startup.
#[derive(Clone, Debug)]
pub struct DeviceIdentity {
    pub name: String,
    pub hostname: String,
    pub mac: String,
    pub icon: String,
}

/// Link status of one device.
///
/// `Unknown` is the state before the first report ever arrives and is never
/// re-entered afterwards.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LinkStatus {
    Unknown,
    Connected,
    Disconnected,
}

/// Per-device event counters shown on the "last 24h" dashboard panel.
///
/// Monotonic; reset only by process restart. Not actually windowed to 24
/// hours -- a known inaccuracy carried over from the deployed behavior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DayCounters {
    pub disconnects: u64,
    pub connects: u64,
}

/// What a single event did to the device's status.
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Went (or stayed) offline.
    Dropped,
    /// Back online. `offline` is absent when the device had never been seen
    /// offline (first contact after startup).
    Restored { offline: Option<Duration> },
    /// Incidental report (DHCP and friends); no status change.
    Touched,
}

/// Live state for one monitored appliance.
///
/// Owned by the engine; all mutation happens through [`apply`](Self::apply)
/// under the engine's per-device lock.
#[derive(Clone, Debug)]
pub struct Device {
    pub key: String,
    pub identity: DeviceIdentity,
    /// Current IP as last reported, seeded from configuration.
    pub network_address: Option<IpAddr>,
    pub status: LinkStatus,
    pub last_seen_at: Option<OffsetDateTime>,
    /// Set on transition into `Connected`, cleared on `Disconnected`.
    pub uptime_started_at: Option<OffsetDateTime>,
    /// Set on transition into `Disconnected`, cleared on `Connected`.
    /// Source of the offline-duration computation.
    pub disconnected_at: Option<OffsetDateTime>,
    pub signal: Option<String>,
    /// Alerts are suppressed while the current time is before this.
    pub muted_until: Option<OffsetDateTime>,
    pub counters_24h: DayCounters,
    pub journal: EventJournal,
}

impl Device {
    pub fn new(
        key: impl Into<String>,
        identity: DeviceIdentity,
        network_address: Option<IpAddr>,
        max_events: usize,
    ) -> Self {
        Self {
            key: key.into(),
            identity,
            network_address,
            status: LinkStatus::Unknown,
            last_seen_at: None,
            uptime_started_at: None,
            disconnected_at: None,
            signal: None,
            muted_until: None,
            counters_24h: DayCounters::default(),
            journal: EventJournal::new(max_events),
        }
    }

    /// Apply one event: update link state, bump counters, journal the event.
    ///
    /// The journal append happens before the caller gets to run any window
    /// arithmetic, so the triggering event is included in its own frequency
    /// count. Returns the transition for the classifier.
    pub fn apply(&mut self, event: LinkEvent) -> Transition {
        self.last_seen_at = Some(event.occurred_at);
        if event.signal.is_some() {
            self.signal = event.signal.clone();
        }
        if event.network_address.is_some() {
            self.network_address = event.network_address;
        }

        let transition = match event.kind {
            EventKind::Disconnected => {
                self.status = LinkStatus::Disconnected;
                self.disconnected_at = Some(event.occurred_at);
                self.uptime_started_at = None;
                self.counters_24h.disconnects += 1;
                Transition::Dropped
            }
            EventKind::Connected => {
                let offline = self.disconnected_at.map(|down| event.occurred_at - down);
                self.status = LinkStatus::Connected;
                self.uptime_started_at = Some(event.occurred_at);
                self.disconnected_at = None;
                self.counters_24h.connects += 1;
                Transition::Restored { offline }
            }
            EventKind::Other => Transition::Touched,
        };

        self.journal.record(event);
        transition
    }

    /// Whether alert delivery is currently muted. Strictly `now < muted_until`.
    pub fn is_muted(&self, now: OffsetDateTime) -> bool {
        self.muted_until.is_some_and(|until| now < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn device() -> Device {
        Device::new(
            "kitchen",
            DeviceIdentity {
                name: "Speaker in the kitchen".into(),
                hostname: "smart-speaker-2".into(),
                mac: "3c:0b:4f:5d:02:78".into(),
                icon: "🔊".into(),
            },
            Some("192.168.1.131".parse().unwrap()),
            100,
        )
    }

    fn at(minutes: i64) -> OffsetDateTime {
        datetime!(2025-06-01 12:00 UTC) + Duration::minutes(minutes)
    }

    #[test]
    fn starts_unknown() {
        let device = device();
        assert_eq!(device.status, LinkStatus::Unknown);
        assert!(device.last_seen_at.is_none());
        assert!(device.disconnected_at.is_none());
    }

    #[test]
    fn disconnect_sets_status_and_counter() {
        let mut device = device();
        let transition = device.apply(LinkEvent::new(EventKind::Disconnected, at(0)));

        assert_eq!(transition, Transition::Dropped);
        assert_eq!(device.status, LinkStatus::Disconnected);
        assert_eq!(device.disconnected_at, Some(at(0)));
        assert!(device.uptime_started_at.is_none());
        assert_eq!(device.counters_24h.disconnects, 1);
        assert_eq!(device.journal.len(), 1);
    }

    #[test]
    fn connect_after_disconnect_reports_offline_duration() {
        let mut device = device();
        device.apply(LinkEvent::new(EventKind::Disconnected, at(0)));
        let transition = device.apply(LinkEvent::new(EventKind::Connected, at(5)));

        assert_eq!(
            transition,
            Transition::Restored {
                offline: Some(Duration::minutes(5))
            }
        );
        assert_eq!(device.status, LinkStatus::Connected);
        assert_eq!(device.uptime_started_at, Some(at(5)));
        assert!(device.disconnected_at.is_none());
        assert_eq!(device.counters_24h.connects, 1);
    }

    #[test]
    fn first_connect_has_no_offline_duration() {
        let mut device = device();
        let transition = device.apply(LinkEvent::new(EventKind::Connected, at(0)));

        assert_eq!(transition, Transition::Restored { offline: None });
    }

    #[test]
    fn other_events_touch_without_transition() {
        let mut device = device();
        device.apply(LinkEvent::new(EventKind::Connected, at(0)));

        let mut lease = LinkEvent::new(EventKind::Other, at(10));
        lease.signal = Some("-48 dBm".into());
        lease.network_address = Some("192.168.1.77".parse().unwrap());
        let transition = device.apply(lease);

        assert_eq!(transition, Transition::Touched);
        assert_eq!(device.status, LinkStatus::Connected);
        assert_eq!(device.last_seen_at, Some(at(10)));
        assert_eq!(device.signal.as_deref(), Some("-48 dBm"));
        assert_eq!(
            device.network_address,
            Some("192.168.1.77".parse().unwrap())
        );
        // Still journaled.
        assert_eq!(device.journal.len(), 2);
        // Counters untouched.
        assert_eq!(device.counters_24h, DayCounters {
            disconnects: 0,
            connects: 1
        });
    }

    #[test]
    fn mute_window_is_half_open() {
        let mut device = device();
        device.muted_until = Some(at(60));

        assert!(device.is_muted(at(0)));
        assert!(device.is_muted(at(59)));
        assert!(!device.is_muted(at(60)));
        assert!(!device.is_muted(at(61)));
    }

    #[test]
    fn unmuted_by_default() {
        let device = device();
        assert!(!device.is_muted(at(0)));
    }
}
