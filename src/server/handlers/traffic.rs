use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::TrafficLookup;
use crate::entities::RouteQuery;
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct FindParams {
    query: RouteQuery,
    route_id: u32,
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<FindParams>,
) -> Result<Json<TrafficLookup>, Error> {
    let lookup = api.find_traffic(params.query, params.route_id).await?;

    Ok(lookup.into())
}
