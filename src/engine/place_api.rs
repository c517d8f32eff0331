use super::Engine;

use async_trait::async_trait;

use crate::{
    api::PlaceAPI, entities::Coordinates, error::Error, external::PlaceSuggestion,
};

#[async_trait]
impl PlaceAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: String) -> Result<Coordinates, Error> {
        self.places.geocode(&address).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_place_suggestions(&self, input: String) -> Result<Vec<PlaceSuggestion>, Error> {
        self.places.place_suggestions(&input).await
    }
}
