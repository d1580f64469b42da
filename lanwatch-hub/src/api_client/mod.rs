//! Typed client for the hub HTTP API, used by the CLI.

pub mod types;

use crate::error::{Error, Result};
use types::{DeviceState, MuteRequest, MuteResponse};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    pub async fn get_devices(&self) -> Result<Vec<DeviceState>> {
        let resp = self
            .http
            .get(format!("{}/v0/devices", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn get_device(&self, key: &str) -> Result<DeviceState> {
        let resp = self
            .http
            .get(format!("{}/v0/devices/{key}", self.base_url))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::UnknownDevice(key.to_string()));
        }
        Ok(resp.error_for_status()?.json().await?)
    }

    pub async fn mute(&self, key: &str, minutes: u64) -> Result<MuteResponse> {
        let resp = self
            .http
            .post(format!("{}/v0/devices/{key}/mute", self.base_url))
            .json(&MuteRequest { minutes })
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::UnknownDevice(key.to_string()));
        }
        Ok(resp.error_for_status()?.json().await?)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
