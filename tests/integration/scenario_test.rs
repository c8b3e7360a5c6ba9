//! Polling and fan-out scenarios driven pass by pass

use crate::support::ScriptedSource;
use price_hub::config::Config;
use price_hub::lifecycle::ConnectionSession;
use price_hub::service::PriceHub;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

fn hub_with(source: Arc<ScriptedSource>) -> PriceHub {
    PriceHub::new(Config::default(), source)
}

async fn assert_no_update(session: &mut ConnectionSession) {
    let received = tokio::time::timeout(Duration::from_millis(50), session.next_update()).await;
    assert!(received.is_err(), "unexpected update: {:?}", received);
}

#[tokio::test]
async fn test_change_detection_then_unsubscribe() {
    let source = Arc::new(ScriptedSource::new());
    source.push("EURUSD", &[dec!(1.1000), dec!(1.1000), dec!(1.1050)]);
    let hub = hub_with(source.clone());
    let scheduler = hub.scheduler();

    let mut session = hub.lifecycle.connect();
    session.subscribe("EURUSD").unwrap();

    // First price is only a baseline
    let report = scheduler.tick().await;
    assert_eq!(report.baselined, 1);
    assert_eq!(hub.cache.get_last(&"EURUSD".parse().unwrap()), Some(dec!(1.1000)));
    assert_no_update(&mut session).await;

    let report = scheduler.tick().await;
    assert_eq!(report.unchanged, 1);
    assert_no_update(&mut session).await;

    let report = scheduler.tick().await;
    assert_eq!(report.broadcast, 1);
    let update = session.next_update().await.unwrap();
    assert_eq!(update.instrument.as_str(), "EURUSD");
    assert_eq!(update.price, dec!(1.1050));

    session.unsubscribe("eurusd").unwrap();
    let report = scheduler.tick().await;
    assert_eq!(report.polled, 0);
    assert_eq!(source.calls("EURUSD"), 3);
}

#[tokio::test]
async fn test_disconnect_stops_delivery_and_polling() {
    let source = Arc::new(ScriptedSource::new());
    source.push("USDJPY", &[dec!(150.10), dec!(150.25), dec!(150.40)]);
    let hub = hub_with(source.clone());
    let scheduler = hub.scheduler();

    let first = hub.lifecycle.connect();
    let mut second = hub.lifecycle.connect();
    first.subscribe("USDJPY").unwrap();
    second.subscribe("USDJPY").unwrap();

    scheduler.tick().await;
    drop(first);
    assert_eq!(hub.hub.len(), 1);
    assert_eq!(hub.registry.subscriber_count(&"USDJPY".parse().unwrap()), 1);

    let report = scheduler.tick().await;
    assert_eq!(report.broadcast, 1);
    assert_eq!(second.next_update().await.unwrap().price, dec!(150.25));

    drop(second);
    assert!(hub.registry.subscribed_instruments().is_empty());
    assert!(hub.hub.is_empty());

    let report = scheduler.tick().await;
    assert_eq!(report.polled, 0);
    assert_eq!(source.calls("USDJPY"), 2);
}

#[tokio::test]
async fn test_subscribers_only_receive_their_instruments() {
    let source = Arc::new(ScriptedSource::new());
    source.push("EURUSD", &[dec!(1.1000), dec!(1.2000)]);
    source.push("BTCUSD", &[dec!(64000), dec!(64100)]);
    let hub = hub_with(source);
    let scheduler = hub.scheduler();

    let mut euro = hub.lifecycle.connect();
    let mut both = hub.lifecycle.connect();
    euro.subscribe("EURUSD").unwrap();
    both.subscribe("EURUSD").unwrap();
    both.subscribe("BTCUSD").unwrap();

    scheduler.tick().await;
    let report = scheduler.tick().await;
    assert_eq!(report.polled, 2);
    assert_eq!(report.broadcast, 2);

    assert_eq!(euro.next_update().await.unwrap().instrument.as_str(), "EURUSD");
    assert_no_update(&mut euro).await;

    let mut seen: Vec<String> = vec![
        both.next_update().await.unwrap().instrument.to_string(),
        both.next_update().await.unwrap().instrument.to_string(),
    ];
    seen.sort();
    assert_eq!(seen, vec!["BTCUSD", "EURUSD"]);
}

#[tokio::test]
async fn test_unavailable_price_keeps_cache() {
    let source = Arc::new(ScriptedSource::new());
    let hub = hub_with(source.clone());
    let scheduler = hub.scheduler();

    let mut session = hub.lifecycle.connect();
    session.subscribe("USDJPY").unwrap();

    let report = scheduler.tick().await;
    assert_eq!(report.unavailable, 1);
    assert!(hub.cache.is_empty());
    assert_no_update(&mut session).await;

    // Recovers on a later pass
    source.push("USDJPY", &[dec!(151.00)]);
    let report = scheduler.tick().await;
    assert_eq!(report.baselined, 1);
}

#[tokio::test]
async fn test_spawned_poller_broadcasts_and_stops() {
    let source = Arc::new(ScriptedSource::new());
    source.push("EURUSD", &[dec!(1.1000), dec!(1.1050)]);
    let mut config = Config::default();
    config.poller.interval_secs = 1;
    let hub = PriceHub::new(config, source);

    let mut session = hub.lifecycle.connect();
    session.subscribe("EURUSD").unwrap();

    let poller = hub.scheduler().spawn();
    let update = tokio::time::timeout(Duration::from_secs(5), session.next_update())
        .await
        .expect("no update within timeout")
        .unwrap();
    assert_eq!(update.price, dec!(1.1050));

    poller.stop().await.unwrap();
}
