use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::{
    cache::ExpiringCache,
    entities::{RouteCandidate, RouteKey, RouteQuery, TrafficSnapshot},
    error::{invalid_input_error, Error},
    external::DirectionsProvider,
    fetcher::{self, RetryPolicy},
    monitor::{TrafficReading, TrafficSource},
};

/// Cached, retried access to the directions provider. Route and traffic
/// results live in separate caches with their own lifetimes.
pub struct Lookups {
    provider: Arc<dyn DirectionsProvider>,
    routes: ExpiringCache<RouteKey, Vec<RouteCandidate>>,
    traffic: ExpiringCache<(RouteKey, u32), TrafficReading>,
    route_policy: RetryPolicy,
    traffic_policy: RetryPolicy,
}

impl Lookups {
    pub fn new(
        provider: Arc<dyn DirectionsProvider>,
        routes: ExpiringCache<RouteKey, Vec<RouteCandidate>>,
        traffic: ExpiringCache<(RouteKey, u32), TrafficReading>,
        route_policy: RetryPolicy,
        traffic_policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            routes,
            traffic,
            route_policy,
            traffic_policy,
        }
    }

    async fn fetch(&self, query: &RouteQuery, policy: &RetryPolicy) -> Result<Vec<RouteCandidate>, Error> {
        let provider = self.provider.clone();

        fetcher::fetch(policy, || {
            let provider = provider.clone();
            let query = query.clone();
            async move { provider.directions(&query).await }
        })
        .await
    }

    /// Returns the candidates for `query` and whether they came from the cache.
    #[tracing::instrument(skip(self))]
    pub async fn routes(&self, query: &RouteQuery) -> Result<(Vec<RouteCandidate>, bool), Error> {
        query.validate()?;

        let key = query.key();

        if let Some(routes) = self.routes.get(&key) {
            tracing::debug!("route cache hit");
            return Ok((routes, true));
        }

        let routes = self.fresh_routes(query).await?;

        Ok((routes, false))
    }

    /// Bypasses the route cache, then stores the result in it.
    #[tracing::instrument(skip(self))]
    pub async fn fresh_routes(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>, Error> {
        query.validate()?;

        let routes = self.fetch(query, &self.route_policy).await?;
        self.routes.put(query.key(), routes.clone());

        Ok(routes)
    }
}

#[async_trait]
impl TrafficSource for Lookups {
    #[tracing::instrument(skip(self))]
    async fn traffic(&self, query: &RouteQuery, route_id: u32) -> Result<TrafficReading, Error> {
        query.validate()?;

        let key = (query.key(), route_id);

        if let Some(reading) = self.traffic.get(&key) {
            tracing::debug!("traffic cache hit");
            return Ok(TrafficReading {
                from_cache: true,
                ..reading
            });
        }

        let candidates = self.fetch(query, &self.traffic_policy).await?;

        let route = candidates
            .iter()
            .find(|candidate| candidate.route_id == route_id)
            .ok_or_else(|| invalid_input_error(format!("unknown route id {}", route_id)))?;

        if !route.has_live_traffic() {
            tracing::debug!("no live traffic for route {}, using free-flow duration", route_id);
        }

        let reading = TrafficReading {
            snapshot: TrafficSnapshot::from_route(route, Utc::now()),
            candidates: candidates.clone(),
            from_cache: false,
        };

        self.traffic.put(key, reading.clone());

        Ok(reading)
    }
}
