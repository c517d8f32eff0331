use super::Engine;

use async_trait::async_trait;

use crate::{
    api::{TrafficAPI, TrafficLookup},
    entities::RouteQuery,
    error::Error,
    monitor::TrafficSource,
};

#[async_trait]
impl TrafficAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_traffic(&self, query: RouteQuery, route_id: u32) -> Result<TrafficLookup, Error> {
        let reading = self.lookups.traffic(&query, route_id).await?;

        Ok(TrafficLookup {
            route_id: reading.snapshot.route_id,
            congestion: reading.snapshot.congestion,
            delay_minutes: reading.snapshot.delay_minutes,
            last_updated: reading.snapshot.observed_at,
            from_cache: reading.from_cache,
        })
    }
}
