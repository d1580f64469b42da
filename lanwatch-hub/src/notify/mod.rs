//! Outbound alert delivery.
//!
//! The engine only ever produces alert values; getting them in front of a
//! human is this module's job. Delivery is at-most-one-attempt by design:
//! a failed send is logged and dropped, never retried or queued.

mod format;
mod telegram;

pub use format::{render_alert, render_threshold};
pub use telegram::TelegramNotifier;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// One button under a delivered message. URL buttons only: the hub has no
/// interactive chat loop, so anything richer belongs to a bot layer outside
/// this repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Button {
    pub text: String,
    pub url: String,
}

/// A sink for human-facing notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. One attempt, no queue.
    async fn notify(&self, text: &str, buttons: &[Button]) -> Result<()>;
}

/// Discards everything. Used in tests and when the hub runs without chat
/// credentials.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(&self, _text: &str, _buttons: &[Button]) -> Result<()> {
        Ok(())
    }
}
