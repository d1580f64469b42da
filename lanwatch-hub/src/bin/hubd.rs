//! The lanwatch hub daemon.
//!
//! Wires configuration, the connectivity engine, the notifier, and the HTTP
//! server together, then runs until ctrl-c.

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use lanwatch_hub::api::server::{serve, SharedState};
use lanwatch_hub::config::{Config, Secrets, CONFIG_ENV};
use lanwatch_hub::metrics::MetricsHistory;
use lanwatch_hub::monitor::Engine;
use lanwatch_hub::notify::{NullNotifier, Notifier, TelegramNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    lanwatch_hub::tracing::init();

    let config_path =
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| "lanwatch.toml".to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;
    let secrets = Secrets::from_env().context("reading secrets from the environment")?;

    let engine = Arc::new(Engine::new(config.monitor_config(), config.fleet()));
    tracing::info!(
        devices = engine.device_count(),
        threshold = engine.config().disconnect_threshold,
        "engine ready"
    );

    let notifier: Arc<dyn Notifier> = match (&secrets.bot_token, &config.telegram.chat_id) {
        (Some(token), Some(chat_id)) => Arc::new(TelegramNotifier::new(token, chat_id.clone())),
        _ => {
            tracing::warn!("telegram credentials missing; alerts will be dropped");
            Arc::new(NullNotifier)
        }
    };

    let state = SharedState {
        engine,
        metrics: Arc::new(Mutex::new(MetricsHistory::new(
            config.metrics.sample_cap,
            config.metrics.alert_cap,
        ))),
        notifier,
        webhook_secret: secrets.webhook_secret.into(),
        hub_url: config.telegram.hub_url.clone().map(Arc::from),
    };

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
                shutdown.cancel();
            }
        });
    }

    serve(state, config.server.bind, shutdown).await?;
    Ok(())
}
