mod common;

use axum::body::{Body, HttpBody};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{candidates, engine, query, FakeMaps};
use detour::error::{no_route_error, upstream_rejected_error, upstream_transient_error};
use detour::server::router;

fn app(maps: std::sync::Arc<FakeMaps>) -> Router {
    let (engine, _rx) = engine(maps);

    router(engine)
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let mut body = response.into_body();
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        bytes.extend_from_slice(&chunk.unwrap());
    }

    (status, serde_json::from_slice(&bytes).unwrap())
}

fn query_json() -> Value {
    serde_json::to_value(query()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn routes_are_served_then_cached() {
    let app = app(FakeMaps::new(vec![]));

    let (status, body) = send(&app, json_request(Method::POST, "/routes", query_json())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], false);
    assert_eq!(body["routes"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, json_request(Method::POST, "/routes", query_json())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], true);
}

#[tokio::test(start_paused = true)]
async fn lookup_failures_map_to_http_statuses() {
    let invalid = json!({
        "origin": { "latitude": 123.0, "longitude": 0.0 },
        "destination": { "latitude": 1.0, "longitude": 1.0 },
    });
    let (status, body) = send(
        &app(FakeMaps::new(vec![])),
        json_request(Method::POST, "/routes", invalid),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 100);

    let (status, body) = send(
        &app(FakeMaps::new(vec![Err(no_route_error())])),
        json_request(Method::POST, "/routes", query_json()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 101);

    let (status, body) = send(
        &app(FakeMaps::new(vec![Err(upstream_rejected_error(403, "REQUEST_DENIED"))])),
        json_request(Method::POST, "/routes", query_json()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "REQUEST_DENIED");

    // one attempt plus three retries, all throttled
    let throttled = (0..4)
        .map(|_| Err(upstream_transient_error(429, "OVER_QUERY_LIMIT")))
        .collect();
    let (status, _) = send(
        &app(FakeMaps::new(throttled)),
        json_request(Method::POST, "/routes", query_json()),
    )
    .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let unavailable = (0..4)
        .map(|_| Err(upstream_transient_error(503, "UNAVAILABLE")))
        .collect();
    let (status, _) = send(
        &app(FakeMaps::new(unavailable)),
        json_request(Method::POST, "/routes", query_json()),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test(start_paused = true)]
async fn compare_reports_a_faster_route() {
    let app = app(FakeMaps::new(vec![Ok(candidates(1500))]));

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/routes/compare",
            json!({ "query": query_json(), "current_route_id": 1 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reason"], "faster");
    assert_eq!(body["alternative"]["route_id"], 2);
}

#[tokio::test(start_paused = true)]
async fn traffic_is_served_for_known_routes_only() {
    let app = app(FakeMaps::new(vec![Ok(candidates(2400))]));

    let (status, body) = send(
        &app,
        json_request(Method::POST, "/traffic", json!({ "query": query_json(), "route_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["congestion"], "heavy");
    assert_eq!(body["delay_minutes"], 20);

    let (status, _) = send(
        &app,
        json_request(Method::POST, "/traffic", json!({ "query": query_json(), "route_id": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn monitor_session_lifecycle() {
    let app = app(FakeMaps::new(vec![]));

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/monitor",
            json!({ "query": query_json(), "route_id": 7, "interval_ms": 60000 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/monitor",
            json!({ "query": query_json(), "route_id": 1, "interval_ms": 60000 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["route_id"], 1);
    assert_eq!(body["interval_ms"], 60000);

    let (status, body) = send(&app, empty_request(Method::GET, "/monitor")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breaker_open"], false);

    let (status, _) = send(&app, empty_request(Method::POST, "/monitor/dismiss")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, empty_request(Method::DELETE, "/monitor")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, empty_request(Method::GET, "/monitor")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn places_are_served_from_query_parameters() {
    let app = app(FakeMaps::new(vec![]));

    let (status, body) = send(
        &app,
        empty_request(Method::GET, "/places/geocode?address=Gare%20du%20Nord"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["latitude"], 48.8809);

    let (status, body) = send(&app, empty_request(Method::GET, "/places/suggestions?input=Gare")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["description"], "Gare station");
}
