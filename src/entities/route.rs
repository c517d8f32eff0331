use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;
use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Driving,
    Walking,
}

impl Default for TravelMode {
    fn default() -> Self {
        TravelMode::Driving
    }
}

impl TravelMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub origin: Coordinates,
    pub destination: Coordinates,
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub include_walking: bool,
}

/// Hashable identity of a [`RouteQuery`], used to key the caches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: (u64, u64),
    destination: (u64, u64),
    mode: TravelMode,
    include_walking: bool,
}

impl RouteQuery {
    pub fn new(origin: Coordinates, destination: Coordinates) -> Self {
        Self {
            origin,
            destination,
            mode: TravelMode::Driving,
            include_walking: false,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.origin.validate()?;
        self.destination.validate()?;

        if self.origin == self.destination {
            return Err(invalid_input_error("origin and destination are identical"));
        }

        Ok(())
    }

    pub fn key(&self) -> RouteKey {
        let bits = |c: &Coordinates| (c.latitude.to_bits(), c.longitude.to_bits());

        RouteKey {
            origin: bits(&self.origin),
            destination: bits(&self.destination),
            mode: self.mode,
            include_walking: self.include_walking,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durations {
    pub driving: u64,
    pub walking: Option<u64>,
}

/// One path option returned for a search. Never mutated once published.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    pub route_id: u32,
    pub path: Vec<Coordinates>,
    pub distance_meters: u64,
    pub duration_seconds: Durations,
    pub duration_in_traffic_seconds: Option<u64>,
    pub is_toll_road: bool,
    pub toll_fee: Option<f64>,
}

impl RouteCandidate {
    pub fn new(
        route_id: u32,
        path: Vec<Coordinates>,
        distance_meters: u64,
        driving_seconds: u64,
    ) -> Result<Self, Error> {
        if route_id == 0 {
            return Err(invalid_input_error("route id must be positive"));
        }

        if path.is_empty() {
            return Err(invalid_input_error(format!("route {} has an empty path", route_id)));
        }

        Ok(Self {
            route_id,
            path,
            distance_meters,
            duration_seconds: Durations {
                driving: driving_seconds,
                walking: None,
            },
            duration_in_traffic_seconds: None,
            is_toll_road: false,
            toll_fee: None,
        })
    }

    pub fn with_walking(mut self, walking_seconds: u64) -> Self {
        self.duration_seconds.walking = Some(walking_seconds);
        self
    }

    pub fn with_traffic(mut self, duration_in_traffic_seconds: u64) -> Self {
        self.duration_in_traffic_seconds = Some(duration_in_traffic_seconds);
        self
    }

    pub fn with_toll(mut self, fee: Option<f64>) -> Self {
        self.is_toll_road = true;
        self.toll_fee = fee;
        self
    }

    /// Live-traffic duration, falling back to the nominal driving duration.
    pub fn traffic_duration_seconds(&self) -> u64 {
        self.duration_in_traffic_seconds
            .unwrap_or(self.duration_seconds.driving)
    }

    pub fn has_live_traffic(&self) -> bool {
        self.duration_in_traffic_seconds.is_some()
    }
}
