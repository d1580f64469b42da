//! Daemon configuration: a TOML file for the fleet and tunables, the
//! environment for secrets.
//!
//! The device registry lives entirely in the file; the hub never discovers
//! devices at runtime. Secrets never live in the file.

use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use time::Duration;

use crate::error::{Error, Result};
use crate::monitor::{Device, DeviceIdentity, MonitorConfig};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LANWATCH_CONFIG";
/// Telegram bot token. Optional; without it alerts are dropped.
pub const BOT_TOKEN_ENV: &str = "LANWATCH_BOT_TOKEN";
/// Shared secret the router must present on webhook calls. Required.
pub const WEBHOOK_SECRET_ENV: &str = "LANWATCH_WEBHOOK_SECRET";

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub metrics: MetricsSettings,
    #[serde(default)]
    pub telegram: TelegramSettings,
    #[serde(rename = "device", default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MonitorSettings {
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_disconnect_threshold")]
    pub disconnect_threshold: usize,
    #[serde(default = "default_disconnect_window_mins")]
    pub disconnect_window_mins: u64,
    #[serde(default = "default_long_offline_mins")]
    pub long_offline_mins: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetricsSettings {
    /// 288 samples is 24 hours at the router's 5-minute cadence.
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
    #[serde(default = "default_alert_cap")]
    pub alert_cap: usize,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TelegramSettings {
    pub chat_id: Option<String>,
    /// Externally reachable base URL of this hub, used for link buttons
    /// under alert messages.
    pub hub_url: Option<String>,
}

/// One `[[device]]` table: a fleet slot.
#[derive(Clone, Debug, Deserialize)]
pub struct DeviceConfig {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub mac: String,
    pub ip: Option<IpAddr>,
    #[serde(default = "default_icon")]
    pub icon: String,
}

impl Config {
    /// Parse the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.as_ref().display())))?;

        if config.devices.is_empty() {
            return Err(Error::Config(
                "no [[device]] entries; the hub has nothing to watch".into(),
            ));
        }
        Ok(config)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            max_events: self.monitor.max_events,
            disconnect_threshold: self.monitor.disconnect_threshold,
            disconnect_window: Duration::minutes(self.monitor.disconnect_window_mins as i64),
            long_offline_threshold: Duration::minutes(self.monitor.long_offline_mins as i64),
        }
    }

    /// Build the fleet, in file order.
    pub fn fleet(&self) -> Vec<Device> {
        self.devices
            .iter()
            .map(|d| {
                Device::new(
                    d.key.clone(),
                    DeviceIdentity {
                        name: d.name.clone(),
                        hostname: d.hostname.clone(),
                        mac: d.mac.clone(),
                        icon: d.icon.clone(),
                    },
                    d.ip,
                    self.monitor.max_events,
                )
            })
            .collect()
    }
}

/// Secrets sourced from the environment only.
#[derive(Clone, Debug)]
pub struct Secrets {
    pub webhook_secret: String,
    pub bot_token: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let webhook_secret = std::env::var(WEBHOOK_SECRET_ENV)
            .map_err(|_| Error::Config(format!("{WEBHOOK_SECRET_ENV} must be set")))?;
        if webhook_secret.is_empty() {
            return Err(Error::Config(format!("{WEBHOOK_SECRET_ENV} is empty")));
        }

        Ok(Self {
            webhook_secret,
            bot_token: std::env::var(BOT_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            disconnect_threshold: default_disconnect_threshold(),
            disconnect_window_mins: default_disconnect_window_mins(),
            long_offline_mins: default_long_offline_mins(),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            sample_cap: default_sample_cap(),
            alert_cap: default_alert_cap(),
        }
    }
}

fn default_bind() -> SocketAddr {
    "0.0.0.0:8080".parse().expect("static literal")
}

fn default_max_events() -> usize {
    100
}

fn default_disconnect_threshold() -> usize {
    3
}

fn default_disconnect_window_mins() -> u64 {
    60
}

fn default_long_offline_mins() -> u64 {
    3
}

fn default_sample_cap() -> usize {
    288
}

fn default_alert_cap() -> usize {
    100
}

fn default_icon() -> String {
    "📱".into()
}
