//! WebSocket route handler
//!
//! One task per connection reads client messages and drains the session's
//! outbox. The session is dropped when the task ends, which removes every
//! subscription the connection held.

use crate::lifecycle::{ConnectionSession, ProtocolError};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::service::PriceHub;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};

/// Create WebSocket routes
pub fn routes() -> Router<PriceHub> {
    Router::new().route("/ws", get(ws_handler))
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<PriceHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: PriceHub) {
    let mut session = state.lifecycle.connect();
    let conn = session.id();

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let text = match inbound {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Binary(_))) => {
                        let reply = ServerMessage::Error {
                            message: "Binary messages not supported".to_string(),
                        };
                        if send(&mut socket, &reply).await.is_err() {
                            break;
                        }
                        continue;
                    }
                    // Ping/pong frames are answered by axum.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(%conn, error = %e, "WebSocket receive error");
                        break;
                    }
                };

                let reply = handle_text(&session, text.as_str());
                if send(&mut socket, &reply).await.is_err() {
                    break;
                }
            }
            update = session.next_update() => {
                let Some(update) = update else { break };
                if send(&mut socket, &ServerMessage::from(update)).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(%conn, "WebSocket task finished");
}

/// Apply one client text frame and build the reply
fn handle_text(session: &ConnectionSession, text: &str) -> ServerMessage {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            return ServerMessage::Error {
                message: format!("Invalid message: {}", e),
            }
        }
    };

    let result = match msg {
        ClientMessage::Subscribe { instrument } => session
            .subscribe(&instrument)
            .map(|instrument| ServerMessage::Subscribed {
                instrument: instrument.into(),
            }),
        ClientMessage::Unsubscribe { instrument } => session
            .unsubscribe(&instrument)
            .map(|instrument| ServerMessage::Unsubscribed {
                instrument: instrument.into(),
            }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e: ProtocolError| {
        tracing::debug!(conn = %session.id(), error = %e, "Rejected client request");
        ServerMessage::Error {
            message: e.to_string(),
        }
    })
}

async fn send(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}
