//! API v0 endpoints.
//!
//! Version 0 signals an unstable API -- breaking changes are expected until
//! the hub reaches 1.0. Webhook routes are authenticated by the
//! `X-Webhook-Secret` header; read routes are open (the hub is expected to
//! sit on a trusted LAN or behind a reverse proxy).

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::server::SharedState;
use crate::api_client::types::{DeviceState, MuteRequest, MuteResponse};
use crate::metrics::{AlertRecord, AlertRecordKind, MetricsSample};
use crate::monitor::{Alert, EventKind, LinkEvent, Outcome};
use crate::notify::{render_alert, render_threshold};
use crate::tracing::prelude::*;

const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Build the v0 API routes with OpenAPI metadata.
pub fn routes() -> OpenApiRouter<SharedState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(list_devices))
        .routes(routes!(get_device))
        .routes(routes!(mute_device))
        .routes(routes!(link_event_webhook))
        .routes(routes!(metrics_webhook))
        .routes(routes!(threshold_webhook))
        .routes(routes!(latest_metrics))
}

/// One connectivity report from the router.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LinkEventReport {
    /// Registry key of the fleet slot (room name).
    pub device: String,
    /// Raw event kind as reported, e.g. "connected", "disconnect", "dhcp".
    pub event: String,
    /// RFC 3339 event time, stamped by the router.
    pub timestamp: String,
    pub signal: Option<String>,
    /// Session duration as reported by the device, e.g. "2h 13m".
    pub uptime: Option<String>,
    pub reason: Option<String>,
    pub ip: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    /// "no_action", "frequent_disconnect", or "long_offline".
    pub outcome: String,
    pub suppressed: bool,
}

/// A router-side threshold breach (RAM, CPU, ...). Forwarded, not debounced.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ThresholdReport {
    pub timestamp: Option<String>,
    /// Breached metric, e.g. "ram" or "cpu".
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThresholdResponse {
    pub severity: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsStored {
    pub stored: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsLatest {
    pub sample: MetricsSample,
    pub recent_alerts: Vec<AlertRecord>,
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = OK, description = "Server is running", body = String),
    ),
)]
async fn health() -> &'static str {
    "OK"
}

/// Return the whole fleet, in configuration order.
#[utoipa::path(
    get,
    path = "/devices",
    tag = "devices",
    responses(
        (status = OK, description = "Fleet snapshots", body = Vec<DeviceState>),
    ),
)]
async fn list_devices(State(state): State<SharedState>) -> Json<Vec<DeviceState>> {
    Json(state.engine.snapshot_all())
}

/// Return a single device by key, or 404 if not configured.
#[utoipa::path(
    get,
    path = "/devices/{key}",
    tag = "devices",
    params(
        ("key" = String, Path, description = "Fleet slot key"),
    ),
    responses(
        (status = OK, description = "Device snapshot", body = DeviceState),
        (status = NOT_FOUND, description = "Unknown device key"),
    ),
)]
async fn get_device(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> Result<Json<DeviceState>, StatusCode> {
    state
        .engine
        .snapshot(&key)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Suppress alert delivery for a device. Overwrites any earlier window.
#[utoipa::path(
    post,
    path = "/devices/{key}/mute",
    tag = "devices",
    params(
        ("key" = String, Path, description = "Fleet slot key"),
    ),
    request_body = MuteRequest,
    responses(
        (status = OK, description = "Mute window set", body = MuteResponse),
        (status = NOT_FOUND, description = "Unknown device key"),
    ),
)]
async fn mute_device(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    Json(req): Json<MuteRequest>,
) -> Result<Json<MuteResponse>, StatusCode> {
    let muted_until = state
        .engine
        .mute(&key, Duration::minutes(req.minutes as i64))
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(MuteResponse { key, muted_until }))
}

/// Ingest one connectivity event from the router.
///
/// The engine decides; this handler only translates. Unknown devices are a
/// caller error (the router's device list has drifted from the hub's), and
/// a bad timestamp is rejected before the engine sees the event, so neither
/// leaves any state behind.
#[utoipa::path(
    post,
    path = "/webhook/link-event",
    tag = "webhooks",
    request_body = LinkEventReport,
    responses(
        (status = OK, description = "Event processed", body = IngestResponse),
        (status = BAD_REQUEST, description = "Unknown device or unparseable timestamp"),
        (status = UNAUTHORIZED, description = "Missing or wrong webhook secret"),
    ),
)]
async fn link_event_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(report): Json<LinkEventReport>,
) -> Result<Json<IngestResponse>, StatusCode> {
    if !authorized(&state, &headers) {
        warn!("unauthorized link-event webhook");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let occurred_at = OffsetDateTime::parse(&report.timestamp, &Rfc3339).map_err(|_| {
        warn!(device = %report.device, timestamp = %report.timestamp, "unparseable event timestamp");
        StatusCode::BAD_REQUEST
    })?;

    let event = LinkEvent {
        occurred_at,
        kind: EventKind::from(report.event.as_str()),
        signal: report.signal,
        uptime_report: report.uptime,
        reason: report.reason,
        network_address: report.ip.as_deref().and_then(|s| s.parse().ok()),
    };

    let outcome = state.engine.ingest(&report.device, event);
    match &outcome {
        Outcome::DeviceNotFound => Err(StatusCode::BAD_REQUEST),

        Outcome::NoAction => Ok(Json(IngestResponse {
            outcome: "no_action".into(),
            suppressed: false,
        })),

        Outcome::Alert { alert, suppressed } => {
            if let Some(record) = AlertRecord::from_outcome(&outcome, OffsetDateTime::now_utc()) {
                state.metrics.lock().push_alert(record);
            }

            if *suppressed {
                debug!(device = %alert.device().key, "alert suppressed by mute window");
            } else {
                deliver(&state, alert);
            }

            let outcome_name = match alert {
                Alert::FrequentDisconnect { .. } => "frequent_disconnect",
                Alert::LongOffline { .. } => "long_offline",
            };
            Ok(Json(IngestResponse {
                outcome: outcome_name.into(),
                suppressed: *suppressed,
            }))
        }
    }
}

/// Store one router health sample.
#[utoipa::path(
    post,
    path = "/webhook/metrics",
    tag = "webhooks",
    request_body = MetricsSample,
    responses(
        (status = OK, description = "Sample stored", body = MetricsStored),
        (status = UNAUTHORIZED, description = "Missing or wrong webhook secret"),
    ),
)]
async fn metrics_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(sample): Json<MetricsSample>,
) -> Result<Json<MetricsStored>, StatusCode> {
    if !authorized(&state, &headers) {
        warn!("unauthorized metrics webhook");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let mut metrics = state.metrics.lock();
    metrics.push_sample(sample);
    Ok(Json(MetricsStored {
        stored: metrics.sample_count(),
    }))
}

/// Record and forward a router-side threshold breach.
#[utoipa::path(
    post,
    path = "/webhook/threshold-alert",
    tag = "webhooks",
    request_body = ThresholdReport,
    responses(
        (status = OK, description = "Breach recorded and forwarded", body = ThresholdResponse),
        (status = UNAUTHORIZED, description = "Missing or wrong webhook secret"),
    ),
)]
async fn threshold_webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(report): Json<ThresholdReport>,
) -> Result<Json<ThresholdResponse>, StatusCode> {
    if !authorized(&state, &headers) {
        warn!("unauthorized threshold webhook");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let at = report
        .timestamp
        .as_deref()
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok())
        .unwrap_or_else(OffsetDateTime::now_utc);
    let severity = if report.value > report.threshold * 1.1 {
        "critical"
    } else {
        "warning"
    };
    warn!(
        kind = %report.kind,
        value = report.value,
        threshold = report.threshold,
        severity,
        "router threshold breach"
    );

    state.metrics.lock().push_alert(AlertRecord {
        at,
        kind: AlertRecordKind::Threshold,
        device: None,
        summary: format!("{} at {} (threshold {})", report.kind, report.value, report.threshold),
        suppressed: false,
    });

    let text = render_threshold(&report.kind, report.value, report.threshold);
    let notifier = Arc::clone(&state.notifier);
    tokio::spawn(async move {
        if let Err(err) = notifier.notify(&text, &[]).await {
            warn!(%err, "threshold alert delivery failed");
        }
    });

    Ok(Json(ThresholdResponse {
        severity: severity.into(),
    }))
}

/// Return the most recent health sample and alert records.
#[utoipa::path(
    get,
    path = "/metrics/latest",
    tag = "metrics",
    responses(
        (status = OK, description = "Latest sample plus recent alerts", body = MetricsLatest),
        (status = NOT_FOUND, description = "No samples stored yet"),
    ),
)]
async fn latest_metrics(
    State(state): State<SharedState>,
) -> Result<Json<MetricsLatest>, StatusCode> {
    let metrics = state.metrics.lock();
    let sample = metrics.latest().cloned().ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(MetricsLatest {
        sample,
        recent_alerts: metrics.recent_alerts(5),
    }))
}

fn authorized(state: &SharedState, headers: &HeaderMap) -> bool {
    headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        == Some(state.webhook_secret.as_ref())
}

/// Hand an alert to the notifier outside the request path. One attempt.
fn deliver(state: &SharedState, alert: &Alert) {
    let (text, buttons) = render_alert(alert, state.hub_url.as_deref());
    let notifier = Arc::clone(&state.notifier);
    let key = alert.device().key.clone();

    tokio::spawn(async move {
        if let Err(err) = notifier.notify(&text, &buttons).await {
            warn!(device = %key, %err, "alert delivery failed");
        }
    });
}
