//! price-hub: realtime price subscription hub
//!
//! This library provides the core components for:
//! - Instrument symbols and connection identities
//! - A concurrent subscription registry
//! - Last-seen price caching with change detection
//! - Fan-out of price updates to per-connection outboxes
//! - Upstream quotes from Alpha Vantage
//! - A cancellable polling scheduler
//! - HTTP and WebSocket endpoints
//! - A reconnecting watch client
//! - Logging and Prometheus metrics

pub mod broadcast;
pub mod cache;
pub mod cli;
pub mod config;
pub mod instrument;
pub mod lifecycle;
pub mod poller;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod service;
pub mod source;
pub mod telemetry;
pub mod ws;
