//! Process-wide shared state
//!
//! Built once at startup and handed to the server and poller; nothing here is global.

use crate::broadcast::{Broadcaster, ConnectionHub};
use crate::cache::PriceCache;
use crate::config::Config;
use crate::lifecycle::ConnectionLifecycle;
use crate::poller::PollingScheduler;
use crate::registry::SubscriptionRegistry;
use crate::source::PriceSource;
use std::sync::Arc;

/// Shared components of a running price hub
#[derive(Clone)]
pub struct PriceHub {
    pub config: Arc<Config>,
    pub registry: Arc<SubscriptionRegistry>,
    pub cache: Arc<PriceCache>,
    pub hub: Arc<ConnectionHub>,
    pub lifecycle: Arc<ConnectionLifecycle>,
    pub broadcaster: Broadcaster,
    pub source: Arc<dyn PriceSource>,
}

impl PriceHub {
    /// Wire all components around `source`
    pub fn new(config: Config, source: Arc<dyn PriceSource>) -> Self {
        let registry = Arc::new(SubscriptionRegistry::new());
        let cache = Arc::new(PriceCache::new());
        let hub = Arc::new(ConnectionHub::new(config.server.outbox_capacity));
        let broadcaster = Broadcaster::new(Arc::clone(&registry), hub.clone());
        let lifecycle = Arc::new(ConnectionLifecycle::new(
            Arc::clone(&registry),
            Arc::clone(&hub),
            config.catalog.clone(),
        ));

        Self {
            config: Arc::new(config),
            registry,
            cache,
            hub,
            lifecycle,
            broadcaster,
            source,
        }
    }

    /// Build the polling scheduler over this hub's state
    pub fn scheduler(&self) -> PollingScheduler {
        PollingScheduler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.cache),
            Arc::clone(&self.source),
            self.broadcaster.clone(),
            self.config.poller.interval(),
        )
        .max_concurrent_fetches(self.config.poller.max_concurrent_fetches)
    }
}

impl std::fmt::Debug for PriceHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PriceHub")
            .field("registry", &self.registry)
            .field("cached_prices", &self.cache.len())
            .field("connections", &self.hub.len())
            .finish_non_exhaustive()
    }
}
