//! Polling scheduler
//!
//! Periodically fetches prices for every instrument that has subscribers and
//! broadcasts the ones that moved since the last broadcast.
//!
//! The first price observed for an instrument is only cached as a baseline; a
//! broadcast happens once a later fetch differs from it. Instruments without
//! subscribers are not fetched at all.

use crate::broadcast::Broadcaster;
use crate::cache::{Observation, PriceCache};
use crate::registry::SubscriptionRegistry;
use crate::source::PriceSource;
use crate::telemetry::{self, FetchOutcome, GaugeMetric};
use futures_util::{future, stream, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Shortest delay allowed between polling passes
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Counters for one polling pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Instruments fetched
    pub polled: usize,
    /// First observations, cached without broadcasting
    pub baselined: usize,
    /// Prices equal to the cached value
    pub unchanged: usize,
    /// Changed prices that were broadcast
    pub broadcast: usize,
    /// Fetches that produced no price
    pub unavailable: usize,
}

/// Background loop driving fetch -> compare -> broadcast
pub struct PollingScheduler {
    registry: Arc<SubscriptionRegistry>,
    cache: Arc<PriceCache>,
    source: Arc<dyn PriceSource>,
    broadcaster: Broadcaster,
    interval: Duration,
    max_concurrent_fetches: usize,
}

impl PollingScheduler {
    /// Create a scheduler polling every `interval`, at least [`MIN_INTERVAL`]
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        cache: Arc<PriceCache>,
        source: Arc<dyn PriceSource>,
        broadcaster: Broadcaster,
        interval: Duration,
    ) -> Self {
        Self {
            registry,
            cache,
            source,
            broadcaster,
            interval: interval.max(MIN_INTERVAL),
            max_concurrent_fetches: 1,
        }
    }

    /// Allow up to `n` upstream fetches in flight per pass
    pub fn max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }

    /// Run one polling pass over the currently subscribed instruments
    pub async fn tick(&self) -> TickReport {
        self.pass(None).await
    }

    /// One pass; once `stop` is raised no further fetches are started, but
    /// fetches already in flight are still compared and broadcast.
    async fn pass(&self, stop: Option<&watch::Receiver<bool>>) -> TickReport {
        let stopping = || stop.is_some_and(|rx| *rx.borrow());
        let instruments = self.registry.subscribed_instruments();
        telemetry::set_gauge(GaugeMetric::SubscribedInstruments, instruments.len());

        let mut report = TickReport::default();
        if instruments.is_empty() {
            return report;
        }

        let mut fetches = stream::iter(instruments)
            .take_while(|_| future::ready(!stopping()))
            .map(|instrument| async move {
                let started = Instant::now();
                let result = self.source.fetch_price(&instrument).await;
                (instrument, result, started.elapsed())
            })
            .buffer_unordered(self.max_concurrent_fetches);

        while let Some((instrument, result, latency)) = fetches.next().await {
            report.polled += 1;

            let price = match result {
                Ok(price) => price,
                Err(e) => {
                    report.unavailable += 1;
                    telemetry::record_fetch(FetchOutcome::Unavailable(e.kind()), latency);
                    tracing::warn!(%instrument, error = %e, "Price unavailable, skipping");
                    continue;
                }
            };

            match self.cache.observe(&instrument, price) {
                Observation::Baseline => {
                    report.baselined += 1;
                    telemetry::record_fetch(FetchOutcome::Baseline, latency);
                    tracing::debug!(%instrument, %price, "Cached baseline price");
                }
                Observation::Unchanged => {
                    report.unchanged += 1;
                    telemetry::record_fetch(FetchOutcome::Unchanged, latency);
                }
                Observation::Changed { previous } => {
                    report.broadcast += 1;
                    telemetry::record_fetch(FetchOutcome::Changed, latency);
                    tracing::debug!(%instrument, %previous, %price, "Price changed");
                    self.broadcaster.publish(&instrument, price);
                }
            }
        }

        report
    }

    /// Start the loop on the tokio runtime
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        PollerHandle { shutdown_tx, join }
    }

    /// Poll until the shutdown flag is raised
    ///
    /// Fetches already started when the flag is raised still complete and
    /// broadcast; the wait between passes is cut short.
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(interval = ?self.interval, "Polling scheduler started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.pass(Some(&shutdown)).await;
            if report.polled > 0 {
                tracing::debug!(?report, "Polling pass complete");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // Handle dropped without stop(); nobody can stop us any more.
                        tracing::warn!("Poller handle dropped, stopping");
                        break;
                    }
                }
            }
        }

        tracing::info!("Polling scheduler stopped");
    }
}

impl std::fmt::Debug for PollingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("interval", &self.interval)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .finish_non_exhaustive()
    }
}

/// Control handle for a spawned [`PollingScheduler`]
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Signal the loop to stop and wait for it to exit
    pub async fn stop(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(true);
        self.join.await?;
        Ok(())
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
