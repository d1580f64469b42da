//! Connectivity events as reported by the router.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Kind of a reported connectivity event.
///
/// The wire format is an open string; anything that is not a connect or a
/// disconnect (DHCP lease renewals, AP roams, vendor extras) collapses into
/// [`Other`](EventKind::Other) so downstream matches stay exhaustive and a
/// new kind is a deliberate enum addition, not a stray string.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "snake_case", from = "String")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Connected,
    Disconnected,
    Other,
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        // Router firmwares disagree on tense; accept both.
        match s {
            "connected" | "connect" => EventKind::Connected,
            "disconnected" | "disconnect" => EventKind::Disconnected,
            _ => EventKind::Other,
        }
    }
}

/// A single connectivity report for one device.
///
/// `occurred_at` is caller-supplied and trusted; the engine never re-stamps
/// events. Events are assumed to arrive in chronological order per device.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkEvent {
    pub occurred_at: OffsetDateTime,
    pub kind: EventKind,
    /// Last reported signal descriptor, e.g. `"-54 dBm"`. Opaque.
    pub signal: Option<String>,
    /// Session duration as reported by the device itself, e.g. `"2h 13m"`.
    /// Free-form; never parsed or derived.
    pub uptime_report: Option<String>,
    pub reason: Option<String>,
    pub network_address: Option<IpAddr>,
}

impl LinkEvent {
    /// A bare event with no optional descriptors.
    pub fn new(kind: EventKind, occurred_at: OffsetDateTime) -> Self {
        Self {
            occurred_at,
            kind,
            signal: None,
            uptime_report: None,
            reason: None,
            network_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_parse_in_both_tenses() {
        assert_eq!(EventKind::from("connected"), EventKind::Connected);
        assert_eq!(EventKind::from("connect"), EventKind::Connected);
        assert_eq!(EventKind::from("disconnected"), EventKind::Disconnected);
        assert_eq!(EventKind::from("disconnect"), EventKind::Disconnected);
    }

    #[test]
    fn unknown_kinds_collapse_to_other() {
        assert_eq!(EventKind::from("dhcp"), EventKind::Other);
        assert_eq!(EventKind::from("roam"), EventKind::Other);
        assert_eq!(EventKind::from(""), EventKind::Other);
    }

    #[test]
    fn kind_deserializes_from_open_string() {
        let kind: EventKind = serde_json::from_str("\"dhcp\"").unwrap();
        assert_eq!(kind, EventKind::Other);

        let kind: EventKind = serde_json::from_str("\"disconnect\"").unwrap();
        assert_eq!(kind, EventKind::Disconnected);
    }
}
