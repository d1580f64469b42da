//! Telegram Bot API delivery channel.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::tracing::prelude::*;

use super::{Button, Notifier};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends messages to one fixed chat via the Bot API.
pub struct TelegramNotifier {
    http: reqwest::Client,
    api_base: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(token: &str, chat_id: impl Into<String>) -> Self {
        Self::with_api_base(format!("https://api.telegram.org/bot{token}"), chat_id)
    }

    /// Point the channel at a different API host. Test hook.
    pub fn with_api_base(api_base: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str, buttons: &[Button]) -> Result<()> {
        let mut payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if !buttons.is_empty() {
            // Single row; the hub never sends more than a couple of links.
            payload["reply_markup"] = json!({ "inline_keyboard": [buttons] });
        }

        let resp = self
            .http
            .post(format!("{}/sendMessage", self.api_base))
            .timeout(SEND_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Other(format!(
                "telegram sendMessage failed: HTTP {status}: {body}"
            )));
        }

        debug!("telegram message delivered");
        Ok(())
    }
}
