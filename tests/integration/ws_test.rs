//! End-to-end WebSocket tests against a live server

use crate::support::ScriptedSource;
use futures_util::{SinkExt, Stream, StreamExt};
use price_hub::config::Config;
use price_hub::instrument::Instrument;
use price_hub::service::PriceHub;
use price_hub::ws::{WatchClient, WatchEvent, WsConfig};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};

struct TestServer {
    hub: PriceHub,
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start(hub: PriceHub) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let (tx, rx) = oneshot::channel::<()>();

        let state = hub.clone();
        tokio::spawn(async move {
            price_hub::server::serve(listener, state, async move {
                let _ = rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            hub,
            url,
            shutdown: Some(tx),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn next_json<S>(read: &mut S) -> Value
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), read.next())
            .await
            .expect("timed out waiting for server message")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn next_event(events: &mut mpsc::Receiver<WatchEvent>) -> WatchEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached");
}

#[tokio::test]
async fn test_subscribe_receive_and_disconnect() {
    let source = Arc::new(ScriptedSource::new());
    source.push("EURUSD", &[dec!(1.1000), dec!(1.1050)]);
    let server = TestServer::start(PriceHub::new(Config::default(), source)).await;
    let scheduler = server.hub.scheduler();

    let (stream, _) = connect_async(server.url.as_str()).await.unwrap();
    let (mut write, mut read) = stream.split();

    let subscribe = json!({"type": "subscribe", "instrument": "eurusd"}).to_string();
    write.send(Message::Text(subscribe)).await.unwrap();
    let ack = next_json(&mut read).await;
    assert_eq!(ack, json!({"type": "subscribed", "instrument": "EURUSD"}));

    scheduler.tick().await;
    scheduler.tick().await;

    let update = next_json(&mut read).await;
    assert_eq!(update["type"], "price_update");
    assert_eq!(update["instrument"], "EURUSD");
    assert_eq!(update["price"], "1.1050");
    assert!(update["timestamp"].is_string());

    write.send(Message::Close(None)).await.unwrap();
    drop(write);
    drop(read);

    let hub = server.hub.clone();
    wait_until(|| hub.hub.is_empty()).await;
    assert!(server.hub.registry.subscribed_instruments().is_empty());
}

#[tokio::test]
async fn test_bad_requests_get_error_replies() {
    let mut config = Config::default();
    config.catalog.strict = true;
    let server = TestServer::start(PriceHub::new(config, Arc::new(ScriptedSource::new()))).await;

    let (stream, _) = connect_async(server.url.as_str()).await.unwrap();
    let (mut write, mut read) = stream.split();

    write.send(Message::Text("{not json".to_string())).await.unwrap();
    assert_eq!(next_json(&mut read).await["type"], "error");

    let unknown = json!({"type": "subscribe", "instrument": "GBPUSD"}).to_string();
    write.send(Message::Text(unknown)).await.unwrap();
    let reply = next_json(&mut read).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("GBPUSD"));

    write
        .send(Message::Text(json!({"type": "ping"}).to_string()))
        .await
        .unwrap();
    assert_eq!(next_json(&mut read).await, json!({"type": "pong"}));

    // Rejections leave no subscriptions behind
    assert!(server.hub.registry.subscribed_instruments().is_empty());
}

#[tokio::test]
async fn test_watch_client_streams_updates() {
    let source = Arc::new(ScriptedSource::new());
    source.push("USDJPY", &[dec!(150.10), dec!(150.20)]);
    let server = TestServer::start(PriceHub::new(Config::default(), source)).await;
    let scheduler = server.hub.scheduler();

    let client = WatchClient::new(
        WsConfig::new(server.url.clone()),
        vec![Instrument::parse("USDJPY").unwrap()],
    );
    let mut events = client.connect();

    assert_eq!(next_event(&mut events).await, WatchEvent::Connected);
    assert_eq!(
        next_event(&mut events).await,
        WatchEvent::Subscribed("USDJPY".to_string())
    );

    scheduler.tick().await;
    scheduler.tick().await;

    match next_event(&mut events).await {
        WatchEvent::Price(update) => {
            assert_eq!(update.instrument.as_str(), "USDJPY");
            assert_eq!(update.price, dec!(150.20));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}
