//! Connectivity watchdog hub for a small fleet of home network appliances.
//!
//! The heart of the crate is the [`monitor`] module: an in-memory engine that
//! consumes connectivity events reported by the home router, tracks
//! per-device link state and a bounded event journal, and debounces the
//! stream into the few alerts a human actually wants to see. Everything else
//! is plumbing around that engine: the [`api`] module receives router
//! webhooks and serves fleet status, [`notify`] pushes alerts to a Telegram
//! chat, and [`metrics`] keeps a short history of router health samples.
//!
//! All state is ephemeral. The hub is designed to be restarted freely; the
//! router re-reports device state as events arrive.

pub mod api;
pub mod api_client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod tracing;
