//! API data transfer objects.
//!
//! These types define the API contract shared between the hub and its
//! clients. The hub also uses [`DeviceState`] internally as the read-only
//! device snapshot, so there is exactly one place where the shape of "what
//! a device looks like from outside" lives.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::monitor::{DayCounters, Device, EventKind, LinkEvent, LinkStatus};

/// How many journal entries a snapshot carries.
const SNAPSHOT_EVENTS: usize = 20;

/// Read-only snapshot of one monitored device.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct DeviceState {
    pub key: String,
    pub name: String,
    pub hostname: String,
    pub mac: String,
    pub icon: String,
    #[schema(value_type = Option<String>)]
    pub ip: Option<IpAddr>,
    pub status: LinkStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_seen_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub uptime_started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub disconnected_at: Option<OffsetDateTime>,
    pub signal: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub muted_until: Option<OffsetDateTime>,
    pub counters_24h: DayCounters,
    /// Newest first, capped well below the full journal.
    pub recent_events: Vec<EventRecord>,
}

impl DeviceState {
    pub fn of(device: &Device) -> Self {
        Self {
            key: device.key.clone(),
            name: device.identity.name.clone(),
            hostname: device.identity.hostname.clone(),
            mac: device.identity.mac.clone(),
            icon: device.identity.icon.clone(),
            ip: device.network_address,
            status: device.status,
            last_seen_at: device.last_seen_at,
            uptime_started_at: device.uptime_started_at,
            disconnected_at: device.disconnected_at,
            signal: device.signal.clone(),
            muted_until: device.muted_until,
            counters_24h: device.counters_24h,
            recent_events: device
                .journal
                .most_recent(SNAPSHOT_EVENTS)
                .map(EventRecord::of)
                .collect(),
        }
    }
}

/// One journal entry as exposed over the API.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct EventRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub kind: EventKind,
    pub signal: Option<String>,
    pub uptime: Option<String>,
    pub reason: Option<String>,
}

impl EventRecord {
    fn of(event: &LinkEvent) -> Self {
        Self {
            occurred_at: event.occurred_at,
            kind: event.kind,
            signal: event.signal.clone(),
            uptime: event.uptime_report.clone(),
            reason: event.reason.clone(),
        }
    }
}

/// Body for `POST /v0/devices/{key}/mute`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct MuteRequest {
    pub minutes: u64,
}

/// Response for `POST /v0/devices/{key}/mute`.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct MuteResponse {
    pub key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub muted_until: OffsetDateTime,
}
