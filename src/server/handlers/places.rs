use axum::extract::{Extension, Json, Query};
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::Error;
use crate::external::PlaceSuggestion;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct GeocodeParams {
    address: String,
}

#[derive(Serialize, Deserialize)]
pub struct SuggestionParams {
    input: String,
}

pub async fn geocode(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<Coordinates>, Error> {
    let coordinates = api.geocode(params.address).await?;

    Ok(coordinates.into())
}

pub async fn find_suggestions(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<Vec<PlaceSuggestion>>, Error> {
    let suggestions = api.find_place_suggestions(params.input).await?;

    Ok(suggestions.into())
}
