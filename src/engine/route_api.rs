use super::Engine;

use async_trait::async_trait;

use crate::{
    api::{RouteAPI, RouteLookup},
    entities::{RouteProposal, RouteQuery},
    error::{invalid_input_error, Error},
};

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_routes(&self, query: RouteQuery) -> Result<RouteLookup, Error> {
        let (routes, from_cache) = self.lookups.routes(&query).await?;

        Ok(RouteLookup { routes, from_cache })
    }

    #[tracing::instrument(skip(self))]
    async fn compare_routes(
        &self,
        query: RouteQuery,
        current_route_id: u32,
    ) -> Result<Option<RouteProposal>, Error> {
        let candidates = self.lookups.fresh_routes(&query).await?;

        let current = candidates
            .iter()
            .find(|candidate| candidate.route_id == current_route_id)
            .ok_or_else(|| invalid_input_error(format!("unknown route id {}", current_route_id)))?;

        Ok(self.comparator.compare(current, &candidates))
    }
}
