//! Alert rendering: engine values in, Telegram-flavored HTML out.

use time::Duration;

use crate::monitor::Alert;

use super::Button;

/// Render an alert into message text plus an optional button row.
///
/// `hub_url` is the externally reachable base URL of this hub, if the
/// operator configured one; it turns the message into a link back to the
/// device's history.
pub fn render_alert(alert: &Alert, hub_url: Option<&str>) -> (String, Vec<Button>) {
    let text = match alert {
        Alert::FrequentDisconnect {
            device,
            recent,
            last_uptime,
            signal,
        } => format!(
            "🚨 <b>{icon} {name}: frequent disconnects</b>\n\n\
             Dropped off the network {recent} times within the last hour.\n\
             Last session: {uptime}\n\
             Last signal: {signal}\n\n\
             Worth checking Wi-Fi coverage, IP conflicts, or the device itself.",
            icon = device.icon,
            name = escape(&device.name),
            uptime = escape(last_uptime.as_deref().unwrap_or("unknown")),
            signal = escape(signal.as_deref().unwrap_or("unknown")),
        ),
        Alert::LongOffline {
            device,
            offline,
            signal,
            network_address,
        } => format!(
            "⚠️ <b>{icon} {name} was offline</b>\n\n\
             Back online after {offline}.\n\
             Signal: {signal}\n\
             IP: {ip}",
            icon = device.icon,
            name = escape(&device.name),
            offline = fmt_duration(*offline),
            signal = escape(signal.as_deref().unwrap_or("unknown")),
            ip = network_address
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "unknown".into()),
        ),
    };

    let buttons = hub_url
        .map(|base| {
            vec![Button {
                text: "📊 Device history".into(),
                url: format!("{}/v0/devices/{}", base.trim_end_matches('/'), alert.device().key),
            }]
        })
        .unwrap_or_default();

    (text, buttons)
}

/// Render a router-side threshold breach (RAM/CPU), forwarded as-is.
pub fn render_threshold(kind: &str, value: f64, threshold: f64) -> String {
    // Same severity split the router dashboard uses.
    let icon = if value > threshold * 1.1 { "🔴" } else { "🟡" };
    let overshoot = if threshold > 0.0 {
        (value / threshold - 1.0) * 100.0
    } else {
        0.0
    };

    format!(
        "{icon} <b>Router alert: {kind}</b>\n\n\
         Current: {value}\n\
         Threshold: {threshold}\n\
         Overshoot: {overshoot:.1}%",
        kind = escape(&kind.to_uppercase()),
    )
}

fn fmt_duration(d: Duration) -> String {
    let total = d.whole_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 && seconds > 0 {
        format!("{minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{seconds}s")
    }
}

/// Minimal HTML escaping for Telegram's HTML parse mode.
fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
