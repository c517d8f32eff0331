use super::Engine;

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    api::MonitorAPI,
    entities::{RouteProposal, RouteQuery},
    error::{invalid_input_error, Error},
    monitor::{PollOutcome, SessionStatus},
};

impl Engine {
    fn monitor_status(&self) -> Result<SessionStatus, Error> {
        self.monitor
            .status()
            .ok_or_else(|| invalid_input_error("no active monitoring session"))
    }
}

#[async_trait]
impl MonitorAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn start_monitoring(
        &self,
        query: RouteQuery,
        route_id: u32,
        interval: Option<Duration>,
    ) -> Result<SessionStatus, Error> {
        let interval = interval.unwrap_or(self.poll_interval);

        let (routes, _) = self.lookups.routes(&query).await?;

        if !routes.iter().any(|route| route.route_id == route_id) {
            return Err(invalid_input_error(format!("unknown route id {}", route_id)));
        }

        self.monitor.start(query, route_id, interval)?;

        self.monitor_status()
    }

    #[tracing::instrument(skip(self))]
    async fn stop_monitoring(&self) -> Result<(), Error> {
        self.monitor.stop();

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_monitor(&self) -> Result<SessionStatus, Error> {
        self.monitor_status()
    }

    #[tracing::instrument(skip(self))]
    async fn refresh_monitor(&self) -> Result<SessionStatus, Error> {
        match self.monitor.refresh().await {
            PollOutcome::Failed(err) => return Err(err),
            outcome => tracing::debug!("refresh outcome: {:?}", outcome),
        }

        self.monitor_status()
    }

    #[tracing::instrument(skip(self))]
    async fn accept_proposal(&self) -> Result<RouteProposal, Error> {
        self.monitor.accept()
    }

    #[tracing::instrument(skip(self))]
    async fn dismiss_proposal(&self) -> Result<RouteProposal, Error> {
        self.monitor.dismiss()
    }
}
