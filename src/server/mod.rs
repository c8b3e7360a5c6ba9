//! HTTP and WebSocket server
//!
//! - `GET /instruments` lists the catalog
//! - `GET /price/{instrument}` performs a one-shot quote
//! - `GET /health`, `GET /health/live` report liveness
//! - `GET /ws` upgrades to the realtime price channel

mod routes;
mod ws;

use crate::service::PriceHub;
use axum::Router;
use std::future::Future;
use tokio::net::TcpListener;

/// Build the full application router
pub fn router(state: PriceHub) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(ws::routes())
        .with_state(state)
}

/// Serve on `listener` until `shutdown` resolves
pub async fn serve(
    listener: TcpListener,
    state: PriceHub,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
