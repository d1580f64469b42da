//! Bounded router health history.
//!
//! The router posts a health sample every few minutes and an alert record
//! whenever something crosses a threshold; the hub keeps a short in-memory
//! tail of both for the dashboard endpoints. Same capped-deque discipline as
//! the per-device journal, same ephemerality: restart and it is gone.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::monitor::{Alert, Outcome};

/// One router health sample.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct MetricsSample {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub ram_percent: f32,
    pub cpu_load1: f32,
    /// Associated Wi-Fi clients.
    pub clients: u32,
    /// Memory footprint of the router's proxy service, if it runs one.
    pub proxy_memory_mb: Option<f32>,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, strum::Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertRecordKind {
    FrequentDisconnect,
    LongOffline,
    Threshold,
}

/// One classified alert, kept for inspection whether or not it was
/// delivered.
#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct AlertRecord {
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
    pub kind: AlertRecordKind,
    /// Device key for connectivity alerts; absent for router-side breaches.
    pub device: Option<String>,
    pub summary: String,
    pub suppressed: bool,
}

impl AlertRecord {
    /// Build a record from an engine outcome, if it carried an alert.
    pub fn from_outcome(outcome: &Outcome, at: OffsetDateTime) -> Option<Self> {
        let Outcome::Alert { alert, suppressed } = outcome else {
            return None;
        };
        let (kind, summary) = match alert {
            Alert::FrequentDisconnect { device, recent, .. } => (
                AlertRecordKind::FrequentDisconnect,
                format!("{} dropped {recent} times within the window", device.name),
            ),
            Alert::LongOffline { device, offline, .. } => (
                AlertRecordKind::LongOffline,
                format!(
                    "{} back online after {}s offline",
                    device.name,
                    offline.whole_seconds()
                ),
            ),
        };
        Some(Self {
            at,
            kind,
            device: Some(alert.device().key.clone()),
            summary,
            suppressed: *suppressed,
        })
    }
}

/// Capped history of samples and alert records.
pub struct MetricsHistory {
    sample_cap: usize,
    alert_cap: usize,
    samples: VecDeque<MetricsSample>,
    alerts: VecDeque<AlertRecord>,
}

impl MetricsHistory {
    pub fn new(sample_cap: usize, alert_cap: usize) -> Self {
        Self {
            sample_cap,
            alert_cap,
            samples: VecDeque::with_capacity(sample_cap.min(512)),
            alerts: VecDeque::with_capacity(alert_cap.min(512)),
        }
    }

    /// Append a sample, evicting the oldest past the cap.
    pub fn push_sample(&mut self, sample: MetricsSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.sample_cap {
            self.samples.pop_front();
        }
    }

    pub fn push_alert(&mut self, record: AlertRecord) {
        self.alerts.push_back(record);
        while self.alerts.len() > self.alert_cap {
            self.alerts.pop_front();
        }
    }

    pub fn latest(&self) -> Option<&MetricsSample> {
        self.samples.back()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// The `n` most recent alert records, newest first.
    pub fn recent_alerts(&self, n: usize) -> Vec<AlertRecord> {
        self.alerts.iter().rev().take(n).cloned().collect()
    }
}
