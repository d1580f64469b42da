//! Alert decision logic.
//!
//! A pure function over the just-updated device record. Two alerts exist:
//!
//! - **Frequent disconnects**: the device dropped off the network at least
//!   `disconnect_threshold` times inside the rolling window ending now,
//!   counting the drop being processed.
//! - **Long offline**: the device came back after being gone strictly longer
//!   than `long_offline_threshold`.
//!
//! Everything else is silence. An isolated disconnect deliberately says
//! nothing; judgment is deferred to the next connect event or to frequency
//! accumulation.

use std::net::IpAddr;
use time::{Duration, OffsetDateTime};

use super::config::MonitorConfig;
use super::device::{Device, Transition};
use super::event::EventKind;

/// Identity slice carried inside alerts so rendering and delivery never need
/// the device lock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRef {
    pub key: String,
    pub name: String,
    pub icon: String,
}

impl DeviceRef {
    fn of(device: &Device) -> Self {
        Self {
            key: device.key.clone(),
            name: device.identity.name.clone(),
            icon: device.identity.icon.clone(),
        }
    }
}

/// A debounced alert, ready for delivery outside the critical section.
#[derive(Clone, Debug, PartialEq)]
pub enum Alert {
    /// The device bounced off the network `recent` times inside the window.
    FrequentDisconnect {
        device: DeviceRef,
        recent: usize,
        /// Session length the device itself reported before this drop.
        last_uptime: Option<String>,
        signal: Option<String>,
    },
    /// The device is back after a real outage.
    LongOffline {
        device: DeviceRef,
        offline: Duration,
        signal: Option<String>,
        network_address: Option<IpAddr>,
    },
}

impl Alert {
    pub fn device(&self) -> &DeviceRef {
        match self {
            Alert::FrequentDisconnect { device, .. } | Alert::LongOffline { device, .. } => device,
        }
    }
}

/// Decide whether `transition` warrants an alert.
///
/// Must run immediately after [`Device::apply`], inside the same critical
/// section, so the journal already contains the triggering event and the
/// frequency count can include it.
pub fn classify(
    device: &Device,
    transition: &Transition,
    now: OffsetDateTime,
    config: &MonitorConfig,
) -> Option<Alert> {
    match transition {
        Transition::Dropped => {
            let recent = device
                .journal
                .count_since(EventKind::Disconnected, now - config.disconnect_window);

            // Inclusive threshold: exactly `disconnect_threshold` drops alert.
            (recent >= config.disconnect_threshold).then(|| Alert::FrequentDisconnect {
                device: DeviceRef::of(device),
                recent,
                last_uptime: device
                    .journal
                    .most_recent(1)
                    .next()
                    .and_then(|e| e.uptime_report.clone()),
                signal: device.signal.clone(),
            })
        }

        // Strictly greater: an outage of exactly the threshold stays silent.
        Transition::Restored {
            offline: Some(offline),
        } if *offline > config.long_offline_threshold => Some(Alert::LongOffline {
            device: DeviceRef::of(device),
            offline: *offline,
            signal: device.signal.clone(),
            network_address: device.network_address,
        }),

        Transition::Restored { .. } | Transition::Touched => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::device::DeviceIdentity;
    use crate::monitor::event::LinkEvent;
    use test_case::test_case;
    use time::macros::datetime;

    fn device() -> Device {
        Device::new(
            "bedroom",
            DeviceIdentity {
                name: "Speaker in the bedroom".into(),
                hostname: "smart-speaker-1".into(),
                mac: "3c:0b:4f:de:d8:3c".into(),
                icon: "📱".into(),
            },
            None,
            100,
        )
    }

    fn at(minutes: i64) -> OffsetDateTime {
        datetime!(2025-06-01 12:00 UTC) + Duration::minutes(minutes)
    }

    fn config() -> MonitorConfig {
        MonitorConfig::default()
    }

    /// Feed `n` disconnects a minute apart and classify the last one.
    fn classify_after_drops(n: usize) -> Option<Alert> {
        let mut device = device();
        let mut last = Transition::Touched;
        for i in 0..n {
            last = device.apply(LinkEvent::new(EventKind::Disconnected, at(i as i64)));
        }
        classify(&device, &last, at(n as i64 - 1), &config())
    }

    #[test_case(1, false; "single drop is silent")]
    #[test_case(2, false; "one below threshold is silent")]
    #[test_case(3, true; "exactly at threshold alerts")]
    #[test_case(4, true; "above threshold alerts")]
    fn frequency_threshold_is_inclusive(drops: usize, expect_alert: bool) {
        assert_eq!(classify_after_drops(drops).is_some(), expect_alert);
    }

    #[test]
    fn frequency_alert_reports_window_count() {
        let Some(Alert::FrequentDisconnect { recent, device, .. }) = classify_after_drops(4)
        else {
            panic!("expected a frequency alert");
        };
        assert_eq!(recent, 4);
        assert_eq!(device.key, "bedroom");
    }

    #[test]
    fn drops_outside_window_do_not_count() {
        let mut device = device();
        // Two old drops, then one fresh drop 61+ minutes later.
        device.apply(LinkEvent::new(EventKind::Disconnected, at(0)));
        device.apply(LinkEvent::new(EventKind::Disconnected, at(1)));
        let last = device.apply(LinkEvent::new(EventKind::Disconnected, at(90)));

        assert_eq!(classify(&device, &last, at(90), &config()), None);
    }

    #[test]
    fn frequency_alert_carries_last_reported_uptime() {
        let mut device = device();
        device.apply(LinkEvent::new(EventKind::Disconnected, at(0)));
        device.apply(LinkEvent::new(EventKind::Disconnected, at(10)));
        let mut event = LinkEvent::new(EventKind::Disconnected, at(20));
        event.uptime_report = Some("9m".into());
        event.signal = Some("-61 dBm".into());
        let last = device.apply(event);

        let Some(Alert::FrequentDisconnect {
            last_uptime,
            signal,
            ..
        }) = classify(&device, &last, at(20), &config())
        else {
            panic!("expected a frequency alert");
        };
        assert_eq!(last_uptime.as_deref(), Some("9m"));
        assert_eq!(signal.as_deref(), Some("-61 dBm"));
    }

    #[test_case(Duration::minutes(3), false; "exactly at threshold stays silent")]
    #[test_case(Duration::minutes(3) + Duration::seconds(1), true; "just over threshold alerts")]
    #[test_case(Duration::minutes(1), false; "short blip stays silent")]
    #[test_case(Duration::minutes(30), true; "long outage alerts")]
    fn offline_threshold_is_strict(offline: Duration, expect_alert: bool) {
        let device = device();
        let transition = Transition::Restored {
            offline: Some(offline),
        };
        let outcome = classify(&device, &transition, at(60), &config());
        assert_eq!(outcome.is_some(), expect_alert);
    }

    #[test]
    fn first_contact_restore_is_silent() {
        let device = device();
        let transition = Transition::Restored { offline: None };
        assert_eq!(classify(&device, &transition, at(0), &config()), None);
    }

    #[test]
    fn touch_is_silent() {
        let device = device();
        assert_eq!(classify(&device, &Transition::Touched, at(0), &config()), None);
    }

    #[test]
    fn long_offline_alert_carries_current_address() {
        let mut device = device();
        device.apply(LinkEvent::new(EventKind::Disconnected, at(0)));
        let mut back = LinkEvent::new(EventKind::Connected, at(10));
        back.network_address = Some("192.168.1.102".parse().unwrap());
        let transition = device.apply(back);

        let Some(Alert::LongOffline {
            offline,
            network_address,
            ..
        }) = classify(&device, &transition, at(10), &config())
        else {
            panic!("expected a long-offline alert");
        };
        assert_eq!(offline, Duration::minutes(10));
        assert_eq!(network_address, Some("192.168.1.102".parse().unwrap()));
    }
}
