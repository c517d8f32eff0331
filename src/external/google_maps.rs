use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    config::Config,
    entities::{Coordinates, RouteCandidate, RouteQuery, TravelMode},
    error::{
        from_status, invalid_input_error, no_route_error, unexpected_error,
        upstream_rejected_error, upstream_transient_error, Error,
    },
    external::{polyline, DirectionsProvider, PlaceSuggestion, PlacesProvider},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response<T> {
    status: String,
    error_message: Option<String>,
    results: Option<T>,
    routes: Option<T>,
    predictions: Option<T>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Value {
    value: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Fare {
    value: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Leg {
    distance: Value,
    duration: Value,
    duration_in_traffic: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Route {
    legs: Vec<Leg>,
    overview_polyline: Polyline,
    #[serde(default)]
    warnings: Vec<String>,
    fare: Option<Fare>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

/// Google Maps web services client (Directions, Geocoding, Places Autocomplete).
#[derive(Clone, Debug)]
pub struct GoogleMaps {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GoogleMaps {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base: config.google_maps_api_base.clone(),
            api_key: config.google_maps_api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("https://{}/maps/api/{}/json", self.api_base, path)
    }

    #[tracing::instrument(skip(self))]
    async fn request_routes(&self, query: &RouteQuery, mode: TravelMode) -> Result<Vec<Route>, Error> {
        let origin: String = query.origin.into();
        let destination: String = query.destination.into();

        let mut request = self
            .client
            .get(self.url("directions"))
            .query(&[("key", self.api_key.as_str())])
            .query(&[("origin", origin), ("destination", destination)])
            .query(&[("mode", mode.name()), ("alternatives", "true")]);

        if mode == TravelMode::Driving {
            request = request.query(&[("departure_time", "now")]);
        }

        let res = request.send().await?;
        let data: Response<Vec<Route>> = parse_response(res).await?;

        data.routes.ok_or_else(|| unexpected_error("directions response without routes"))
    }
}

async fn parse_response<T>(res: reqwest::Response) -> Result<Response<T>, Error>
where
    T: serde::de::DeserializeOwned,
{
    let status_code = res.status().as_u16();

    if status_code != 200 {
        let text = res.text().await.unwrap_or_default();
        return Err(from_status(status_code, text));
    }

    let data: Response<T> = res.json().await?;
    check_status(&data.status, data.error_message.as_deref())?;

    Ok(data)
}

/// Maps the provider's body-level status onto the error taxonomy.
fn check_status(status: &str, error_message: Option<&str>) -> Result<(), Error> {
    let message = match error_message {
        Some(message) => format!("{}: {}", status, message),
        None => status.to_string(),
    };

    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" | "NOT_FOUND" => Err(Error {
            message,
            ..no_route_error()
        }),
        "INVALID_REQUEST" | "MAX_WAYPOINTS_EXCEEDED" => Err(invalid_input_error(message)),
        "REQUEST_DENIED" => Err(upstream_rejected_error(403, message)),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(upstream_transient_error(429, message)),
        "UNKNOWN_ERROR" => Err(upstream_transient_error(500, message)),
        _ => Err(upstream_rejected_error(502, message)),
    }
}

fn into_candidates(routes: Vec<Route>, walking_seconds: Option<u64>) -> Result<Vec<RouteCandidate>, Error> {
    if routes.is_empty() {
        return Err(no_route_error());
    }

    routes
        .into_iter()
        .enumerate()
        .map(|(index, route)| -> Result<RouteCandidate, Error> {
            let path: Vec<Coordinates> = polyline::decode(&route.overview_polyline.points)?
                .coords()
                .map(|coord| Coordinates::from(*coord))
                .collect();

            let distance = route.legs.iter().map(|leg| leg.distance.value).sum();
            let duration = route.legs.iter().map(|leg| leg.duration.value).sum();
            let in_traffic: Option<u64> = route
                .legs
                .iter()
                .map(|leg| leg.duration_in_traffic.as_ref().map(|v| v.value))
                .sum();

            let mut candidate = RouteCandidate::new(index as u32 + 1, path, distance, duration)?;

            if let Some(seconds) = in_traffic {
                candidate = candidate.with_traffic(seconds);
            }

            if let Some(seconds) = walking_seconds {
                candidate = candidate.with_walking(seconds);
            }

            if route
                .warnings
                .iter()
                .any(|warning| warning.to_lowercase().contains("toll"))
            {
                candidate = candidate.with_toll(route.fare.map(|fare| fare.value));
            }

            Ok(candidate)
        })
        .collect()
}

#[async_trait]
impl DirectionsProvider for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn directions(&self, query: &RouteQuery) -> Result<Vec<RouteCandidate>, Error> {
        let (routes, walking) = if query.include_walking && query.mode == TravelMode::Driving {
            let (routes, walking) = futures::try_join!(
                self.request_routes(query, TravelMode::Driving),
                self.request_routes(query, TravelMode::Walking)
            )?;

            let walking_seconds = walking
                .first()
                .map(|route| route.legs.iter().map(|leg| leg.duration.value).sum::<u64>());

            (routes, walking_seconds)
        } else {
            (self.request_routes(query, query.mode).await?, None)
        };

        let candidates = into_candidates(routes, walking)?;

        tracing::debug!("received {} route candidates", candidates.len());

        Ok(candidates)
    }
}

#[async_trait]
impl PlacesProvider for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, address: &str) -> Result<Coordinates, Error> {
        if address.trim().is_empty() {
            return Err(invalid_input_error("empty address"));
        }

        let res = self
            .client
            .get(self.url("geocode"))
            .query(&[("key", self.api_key.as_str()), ("address", address)])
            .send()
            .await?;

        let data: Response<Vec<GeocodeResult>> = parse_response(res).await?;

        let result = data
            .results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(no_route_error)?;

        Ok(Coordinates::new(
            result.geometry.location.lat,
            result.geometry.location.lng,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn place_suggestions(&self, input: &str) -> Result<Vec<PlaceSuggestion>, Error> {
        let res = self
            .client
            .get(self.url("place/autocomplete"))
            .query(&[("key", self.api_key.as_str()), ("input", input)])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code != 200 {
            return Err(from_status(status_code, res.text().await.unwrap_or_default()));
        }

        let data: Response<Vec<PlaceSuggestion>> = res.json().await?;

        if data.status == "ZERO_RESULTS" {
            return Ok(vec![]);
        }

        check_status(&data.status, data.error_message.as_deref())?;

        Ok(data.predictions.unwrap_or_default())
    }
}
