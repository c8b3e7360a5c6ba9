//! HTTP route tests

use crate::support::ScriptedSource;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use price_hub::config::Config;
use price_hub::instrument::Instrument;
use price_hub::server::router;
use price_hub::service::PriceHub;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

async fn get(hub: &PriceHub, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router(hub.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_list_instruments() {
    let hub = PriceHub::new(Config::default(), Arc::new(ScriptedSource::new()));

    let (status, body) = get(&hub, "/instruments").await;
    assert_eq!(status, StatusCode::OK);
    let instruments: Vec<String> = serde_json::from_slice(&body).unwrap();
    assert_eq!(instruments, vec!["EURUSD", "USDJPY", "BTCUSD"]);
}

#[tokio::test]
async fn test_one_shot_quote() {
    let source = Arc::new(ScriptedSource::new());
    source.push("EURUSD", &[dec!(1.0850)]);
    let hub = PriceHub::new(Config::default(), source.clone());

    let (status, body) = get(&hub, "/price/eurusd").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["instrument"], "EURUSD");
    assert_eq!(json["price"], "1.0850");

    // Quotes neither subscribe nor seed the cache
    assert!(hub.cache.is_empty());
    assert!(hub.registry.subscribed_instruments().is_empty());
    assert_eq!(source.calls("EURUSD"), 1);
}

#[tokio::test]
async fn test_quote_not_found() {
    let hub = PriceHub::new(Config::default(), Arc::new(ScriptedSource::new()));

    // Upstream has no price
    let (status, _) = get(&hub, "/price/GBPUSD").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Malformed symbol
    let (status, _) = get(&hub, "/price/EUR-USD").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_strict_catalog_rejects_unlisted_quote() {
    let source = Arc::new(ScriptedSource::new());
    source.push("GBPUSD", &[dec!(1.2700)]);
    let mut config = Config::default();
    config.catalog.strict = true;
    let hub = PriceHub::new(config, source.clone());

    let (status, _) = get(&hub, "/price/GBPUSD").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(source.calls("GBPUSD"), 0);
}

#[tokio::test]
async fn test_health_reports_counts() {
    let hub = PriceHub::new(Config::default(), Arc::new(ScriptedSource::new()));
    let session = hub.lifecycle.connect();
    session.subscribe("BTCUSD").unwrap();
    hub.cache.set_last(&Instrument::parse("BTCUSD").unwrap(), dec!(64000));

    let (status, body) = get(&hub, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["connections"], 1);
    assert_eq!(json["subscribed_instruments"], 1);
    assert_eq!(json["cached_prices"], 1);

    let (status, body) = get(&hub, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}
