mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};

use crate::api::API;
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{monitor, places, routes, traffic};

type DynAPI = Arc<dyn API + Send + Sync>;

pub fn router<T: API + Sync + Send + 'static>(api: T) -> Router {
    let api = Arc::new(api) as DynAPI;

    Router::new()
        .route("/routes", post(routes::create))
        .route("/routes/compare", post(routes::compare))
        .route("/traffic", post(traffic::find))
        .route(
            "/monitor",
            post(monitor::start).get(monitor::find).delete(monitor::stop),
        )
        .route("/monitor/refresh", post(monitor::refresh))
        .route("/monitor/accept", post(monitor::accept))
        .route("/monitor/dismiss", post(monitor::dismiss))
        .route("/places/geocode", get(places::geocode))
        .route("/places/suggestions", get(places::find_suggestions))
        .layer(Extension(api))
}

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) -> Result<(), Error> {
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|err| unexpected_error(format!("server error: {}", err)))
}
