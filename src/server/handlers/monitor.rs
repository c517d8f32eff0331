use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::entities::{RouteProposal, RouteQuery};
use crate::error::Error;
use crate::monitor::SessionStatus;
use crate::server::DynAPI;

#[derive(Serialize, Deserialize)]
pub struct StartParams {
    query: RouteQuery,
    route_id: u32,
    interval_ms: Option<u64>,
}

pub async fn start(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<StartParams>,
) -> Result<Json<SessionStatus>, Error> {
    let status = api
        .start_monitoring(
            params.query,
            params.route_id,
            params.interval_ms.map(Duration::from_millis),
        )
        .await?;

    Ok(status.into())
}

pub async fn stop(Extension(api): Extension<DynAPI>) -> Result<Json<()>, Error> {
    api.stop_monitoring().await?;

    Ok(().into())
}

pub async fn find(Extension(api): Extension<DynAPI>) -> Result<Json<SessionStatus>, Error> {
    let status = api.find_monitor().await?;

    Ok(status.into())
}

pub async fn refresh(Extension(api): Extension<DynAPI>) -> Result<Json<SessionStatus>, Error> {
    let status = api.refresh_monitor().await?;

    Ok(status.into())
}

pub async fn accept(Extension(api): Extension<DynAPI>) -> Result<Json<RouteProposal>, Error> {
    let proposal = api.accept_proposal().await?;

    Ok(proposal.into())
}

pub async fn dismiss(Extension(api): Extension<DynAPI>) -> Result<Json<RouteProposal>, Error> {
    let proposal = api.dismiss_proposal().await?;

    Ok(proposal.into())
}
