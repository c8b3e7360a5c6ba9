//! WebSocket client library
//!
//! Watches the realtime price channel with automatic reconnection and
//! configurable backoff.

mod client;
mod types;

pub use client::WatchClient;
pub use types::{WatchEvent, WsConfig, WsError};
