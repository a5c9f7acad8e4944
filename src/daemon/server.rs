use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::daemon::DaemonState;
use crate::error::DeployhookError;

/// Serve the webhook endpoint until `shutdown` resolves
pub async fn run<F>(state: Arc<DaemonState>, shutdown: F) -> Result<(), DeployhookError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        "Webhook server listening on {} (POST {})",
        addr,
        state.config.listener.path
    );

    let router = create_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// The one route; everything else falls through to axum's 404/405
pub fn create_router(state: Arc<DaemonState>) -> Router {
    let path = state.config.listener.path.clone();
    let max_body = state.config.listener.max_body_bytes;

    Router::new()
        .route(&path, post(crate::daemon::webhook::handle_webhook))
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}
