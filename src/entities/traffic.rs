use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::RouteCandidate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CongestionLevel {
    Smooth,
    Light,
    Moderate,
    Heavy,
}

impl CongestionLevel {
    /// Classifies a delay by `severity = ceil(delay / 5)`.
    pub fn from_delay_minutes(delay_minutes: u64) -> Self {
        match (delay_minutes + 4) / 5 {
            0 | 1 => Self::Smooth,
            2 => Self::Light,
            3 => Self::Moderate,
            _ => Self::Heavy,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Smooth => "smooth",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::Heavy => "heavy",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficSnapshot {
    pub route_id: u32,
    pub congestion: CongestionLevel,
    pub delay_minutes: u64,
    pub duration_seconds: u64,
    pub duration_in_traffic_seconds: u64,
    pub observed_at: DateTime<Utc>,
}

impl TrafficSnapshot {
    pub fn from_route(route: &RouteCandidate, observed_at: DateTime<Utc>) -> Self {
        let duration = route.duration_seconds.driving;
        let in_traffic = route.traffic_duration_seconds();
        let delay_minutes = delay_minutes(duration, in_traffic);

        Self {
            route_id: route.route_id,
            congestion: CongestionLevel::from_delay_minutes(delay_minutes),
            delay_minutes,
            duration_seconds: duration,
            duration_in_traffic_seconds: in_traffic,
            observed_at,
        }
    }

    /// Value comparison ignoring the observation time.
    pub fn same_conditions(&self, other: &TrafficSnapshot) -> bool {
        self.route_id == other.route_id
            && self.congestion == other.congestion
            && self.delay_minutes == other.delay_minutes
            && self.duration_seconds == other.duration_seconds
            && self.duration_in_traffic_seconds == other.duration_in_traffic_seconds
    }
}

/// `round((in_traffic - duration) / 60)`, floored at zero.
pub fn delay_minutes(duration_seconds: u64, in_traffic_seconds: u64) -> u64 {
    let extra = in_traffic_seconds.saturating_sub(duration_seconds);
    (extra + 30) / 60
}
