use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::entities::{CongestionLevel, Coordinates, RouteCandidate, RouteProposal, RouteQuery};
use crate::error::Error;
use crate::external::PlaceSuggestion;
use crate::monitor::SessionStatus;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteLookup {
    pub routes: Vec<RouteCandidate>,
    pub from_cache: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficLookup {
    pub route_id: u32,
    pub congestion: CongestionLevel,
    pub delay_minutes: u64,
    pub last_updated: DateTime<Utc>,
    pub from_cache: bool,
}

#[async_trait]
pub trait RouteAPI {
    async fn find_routes(&self, query: RouteQuery) -> Result<RouteLookup, Error>;
    async fn compare_routes(
        &self,
        query: RouteQuery,
        current_route_id: u32,
    ) -> Result<Option<RouteProposal>, Error>;
}

#[async_trait]
pub trait TrafficAPI {
    async fn find_traffic(&self, query: RouteQuery, route_id: u32) -> Result<TrafficLookup, Error>;
}

#[async_trait]
pub trait MonitorAPI {
    async fn start_monitoring(
        &self,
        query: RouteQuery,
        route_id: u32,
        interval: Option<Duration>,
    ) -> Result<SessionStatus, Error>;
    async fn stop_monitoring(&self) -> Result<(), Error>;
    async fn find_monitor(&self) -> Result<SessionStatus, Error>;
    async fn refresh_monitor(&self) -> Result<SessionStatus, Error>;
    async fn accept_proposal(&self) -> Result<RouteProposal, Error>;
    async fn dismiss_proposal(&self) -> Result<RouteProposal, Error>;
}

#[async_trait]
pub trait PlaceAPI {
    async fn geocode(&self, address: String) -> Result<Coordinates, Error>;
    async fn find_place_suggestions(&self, input: String) -> Result<Vec<PlaceSuggestion>, Error>;
}

pub trait API: RouteAPI + TrafficAPI + MonitorAPI + PlaceAPI {}
