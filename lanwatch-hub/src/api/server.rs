//! Server assembly and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::Result;
use crate::metrics::MetricsHistory;
use crate::monitor::Engine;
use crate::notify::Notifier;
use crate::tracing::prelude::*;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct SharedState {
    pub engine: Arc<Engine>,
    pub metrics: Arc<Mutex<MetricsHistory>>,
    pub notifier: Arc<dyn Notifier>,
    /// Shared secret the router presents on webhook calls.
    pub webhook_secret: Arc<str>,
    /// Externally reachable base URL for link buttons, if configured.
    pub hub_url: Option<Arc<str>>,
}

#[derive(OpenApi)]
#[openapi(info(
    title = "lanwatch API",
    description = "Fleet connectivity status, router webhooks, and alert history"
))]
struct ApiDoc;

/// Build the full application router.
pub fn router(state: SharedState) -> Router {
    let (router, api) = OpenApiRouter::<SharedState>::with_openapi(ApiDoc::openapi())
        .nest("/v0", super::v0::routes())
        .split_for_parts();

    router
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", api))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` fires.
pub async fn serve(state: SharedState, bind: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("API server stopped");
    Ok(())
}
