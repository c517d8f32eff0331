#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use detour::engine::{Engine, EngineOptions};
use detour::entities::{Coordinates, RouteCandidate, RouteQuery};
use detour::error::{invalid_input_error, Error};
use detour::external::{DirectionsProvider, PlaceSuggestion, PlacesProvider};
use detour::notify::Notification;

pub struct FakeMaps {
    responses: Mutex<VecDeque<Result<Vec<RouteCandidate>, Error>>>,
    calls: AtomicU32,
}

impl FakeMaps {
    pub fn new(responses: Vec<Result<Vec<RouteCandidate>, Error>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectionsProvider for FakeMaps {
    async fn directions(&self, _query: &RouteQuery) -> Result<Vec<RouteCandidate>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(candidates(1200)))
    }
}

#[async_trait]
impl PlacesProvider for FakeMaps {
    async fn geocode(&self, address: &str) -> Result<Coordinates, Error> {
        match address {
            "Gare du Nord" => Ok(Coordinates::new(48.8809, 2.3553)),
            _ => Err(invalid_input_error("unknown address")),
        }
    }

    async fn place_suggestions(&self, input: &str) -> Result<Vec<PlaceSuggestion>, Error> {
        Ok(vec![PlaceSuggestion {
            place_id: "abc".into(),
            description: format!("{} station", input),
        }])
    }
}

pub fn query() -> RouteQuery {
    RouteQuery::new(Coordinates::new(48.8566, 2.3522), Coordinates::new(48.8049, 2.1204))
}

/// A free route whose live duration is `free_seconds`, and a toll route.
pub fn candidates(free_seconds: u64) -> Vec<RouteCandidate> {
    let path = vec![Coordinates::new(48.8566, 2.3522), Coordinates::new(48.8049, 2.1204)];

    vec![
        RouteCandidate::new(1, path.clone(), 21_000, 1200)
            .unwrap()
            .with_traffic(free_seconds),
        RouteCandidate::new(2, path, 24_000, 1100)
            .unwrap()
            .with_traffic(1150)
            .with_toll(Some(3.2)),
    ]
}

pub fn engine(maps: Arc<FakeMaps>) -> (Engine, async_channel::Receiver<Notification>) {
    let (tx, rx) = async_channel::unbounded();
    let engine = Engine::new(maps.clone(), maps, Arc::new(tx), EngineOptions::default());

    (engine, rx)
}

