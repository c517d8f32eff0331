pub mod google_maps;
pub mod polyline;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::{Coordinates, RouteCandidate, RouteQuery};
use crate::error::Error;

/// Upstream source of candidate routes, with live traffic where available.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn directions(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>, Error>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub description: String,
}

/// Address resolution; only used to fill in route queries.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, Error>;
    async fn place_suggestions(&self, input: &str) -> Result<Vec<PlaceSuggestion>, Error>;
}
