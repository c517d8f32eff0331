use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::RouteLookup;
use crate::entities::{RouteProposal, RouteQuery};
use crate::error::Error;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct CompareParams {
    query: RouteQuery,
    current_route_id: u32,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(query): Json<RouteQuery>,
) -> Result<Json<RouteLookup>, Error> {
    let lookup = api.find_routes(query).await?;

    Ok(lookup.into())
}

pub async fn compare(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<CompareParams>,
) -> Result<Json<Option<RouteProposal>>, Error> {
    let proposal = api
        .compare_routes(params.query, params.current_route_id)
        .await?;

    Ok(proposal.into())
}
