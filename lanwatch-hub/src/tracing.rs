//! Tracing setup and convenience re-exports.

/// The macros every module wants, importable in one line as
/// `use crate::tracing::prelude::*`.
pub mod prelude {
    pub use ::tracing::{debug, error, info, trace, warn};
}

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Honors `RUST_LOG`; without it the hub logs at info and everything else
/// at warn. Output goes to stdout, which is where container platforms
/// expect it.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,lanwatch_hub=info,tower_http=info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
