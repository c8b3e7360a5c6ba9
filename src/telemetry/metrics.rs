//! Prometheus metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless a
//! recorder is installed (see [`super::init_telemetry`]).

use crate::broadcast::PublishReport;
use std::net::SocketAddr;
use std::time::Duration;

/// Outcome of one upstream fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// First price seen for the instrument
    Baseline,
    /// Same as the cached price
    Unchanged,
    /// Differs from the cached price
    Changed,
    /// Price unavailable; carries the error kind
    Unavailable(&'static str),
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Live realtime connections
    Connections,
    /// Instruments with at least one subscriber
    SubscribedInstruments,
}

/// Record one upstream fetch and its latency
pub fn record_fetch(outcome: FetchOutcome, latency: Duration) {
    let label = match outcome {
        FetchOutcome::Baseline => "baseline",
        FetchOutcome::Unchanged => "unchanged",
        FetchOutcome::Changed => "changed",
        FetchOutcome::Unavailable(kind) => kind,
    };

    metrics::counter!("pricehub_fetch_total", "outcome" => label).increment(1);
    metrics::histogram!("pricehub_fetch_latency_ms").record(latency.as_secs_f64() * 1000.0);
}

/// Record one broadcast
pub fn record_publish(report: &PublishReport) {
    metrics::counter!("pricehub_broadcasts_total").increment(1);
    metrics::counter!("pricehub_deliveries_total").increment(report.delivered as u64);
    metrics::counter!("pricehub_deliveries_dropped_total").increment(report.dropped as u64);
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: usize) {
    let metric_name = match metric {
        GaugeMetric::Connections => "pricehub_connections",
        GaugeMetric::SubscribedInstruments => "pricehub_subscribed_instruments",
    };

    metrics::gauge!(metric_name).set(value as f64);
}

/// Install the Prometheus recorder with an HTTP scrape endpoint on `addr`
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
