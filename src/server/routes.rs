//! Read-only HTTP endpoints

use crate::instrument::Instrument;
use crate::service::PriceHub;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// One-shot quote response
#[derive(Debug, Serialize)]
struct QuoteResponse {
    instrument: Instrument,
    price: Decimal,
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    connections: usize,
    subscribed_instruments: usize,
    cached_prices: usize,
}

/// Create read-only routes
pub fn routes() -> Router<PriceHub> {
    Router::new()
        .route("/instruments", get(list_instruments))
        .route("/price/{instrument}", get(get_price))
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
}

/// Catalog of offered instruments
async fn list_instruments(State(state): State<PriceHub>) -> Json<Vec<Instrument>> {
    Json(state.config.catalog.instruments.clone())
}

/// Current price, fetched upstream on demand
async fn get_price(
    State(state): State<PriceHub>,
    Path(raw): Path<String>,
) -> Result<Json<QuoteResponse>, StatusCode> {
    let instrument = Instrument::parse(&raw).map_err(|_| StatusCode::NOT_FOUND)?;
    if !state.config.catalog.allows(&instrument) {
        return Err(StatusCode::NOT_FOUND);
    }

    match state.source.fetch_price(&instrument).await {
        Ok(price) => Ok(Json(QuoteResponse { instrument, price })),
        Err(e) => {
            tracing::warn!(%instrument, error = %e, "One-shot quote failed");
            Err(StatusCode::NOT_FOUND)
        }
    }
}

async fn health_check(State(state): State<PriceHub>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        connections: state.hub.len(),
        subscribed_instruments: state.registry.subscribed_instruments().len(),
        cached_prices: state.cache.len(),
    })
}

/// Simple liveness check (always returns OK if server is running)
async fn liveness() -> &'static str {
    "OK"
}
