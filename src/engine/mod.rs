mod lookups;
mod monitor_api;
mod place_api;
mod route_api;
mod traffic_api;

pub use lookups::Lookups;

use std::sync::Arc;
use std::time::Duration;

use crate::{
    api::API,
    cache::{ExpiringCache, ROUTE_CACHE_TTL, TRAFFIC_CACHE_TTL},
    external::{DirectionsProvider, PlacesProvider},
    fetcher::RetryPolicy,
    monitor::{DecisionConfig, DecisionEngine, MonitorSession, PollerConfig, DEFAULT_POLL_INTERVAL},
    notify::NotificationSurface,
};

#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub route_cache_ttl: Duration,
    pub traffic_cache_ttl: Duration,
    pub route_policy: RetryPolicy,
    pub traffic_policy: RetryPolicy,
    pub poll_interval: Duration,
    pub poller: PollerConfig,
    pub decision: DecisionConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            route_cache_ttl: ROUTE_CACHE_TTL,
            traffic_cache_ttl: TRAFFIC_CACHE_TTL,
            route_policy: RetryPolicy::routes(),
            traffic_policy: RetryPolicy::traffic(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poller: PollerConfig::default(),
            decision: DecisionConfig::default(),
        }
    }
}

pub struct Engine {
    lookups: Arc<Lookups>,
    places: Arc<dyn PlacesProvider>,
    monitor: MonitorSession,
    comparator: DecisionEngine,
    poll_interval: Duration,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(
        directions: Arc<dyn DirectionsProvider>,
        places: Arc<dyn PlacesProvider>,
        notifier: Arc<dyn NotificationSurface>,
        options: EngineOptions,
    ) -> Self {
        let lookups = Arc::new(Lookups::new(
            directions,
            ExpiringCache::new(options.route_cache_ttl),
            ExpiringCache::new(options.traffic_cache_ttl),
            options.route_policy,
            options.traffic_policy,
        ));

        let monitor = MonitorSession::new(
            lookups.clone(),
            notifier,
            options.poller,
            options.decision.clone(),
        );

        Self {
            lookups,
            places,
            monitor,
            comparator: DecisionEngine::new(options.decision),
            poll_interval: options.poll_interval,
        }
    }
}

impl API for Engine {}
