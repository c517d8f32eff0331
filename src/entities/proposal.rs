use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::RouteCandidate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    Congestion,
    Incident,
    Clear,
    Faster,
}

/// How the alternative's duration was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimate {
    /// Current duration minus a fixed assumed saving.
    Assumed,
    /// Live-traffic duration reported by the provider.
    Measured,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteProposal {
    pub id: Uuid,
    pub reason: Reason,
    pub estimate: Estimate,
    pub current: RouteCandidate,
    pub alternative: RouteCandidate,
    pub current_duration_seconds: u64,
    pub alternative_duration_seconds: u64,
    pub created_at: DateTime<Utc>,
}

impl RouteProposal {
    pub fn new(
        reason: Reason,
        estimate: Estimate,
        current: RouteCandidate,
        alternative: RouteCandidate,
        alternative_duration_seconds: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reason,
            estimate,
            current_duration_seconds: current.traffic_duration_seconds(),
            current,
            alternative,
            alternative_duration_seconds,
            created_at: Utc::now(),
        }
    }

    /// Negative when the alternative is slower (e.g. reverting to a free road).
    pub fn time_saved_seconds(&self) -> i64 {
        self.current_duration_seconds as i64 - self.alternative_duration_seconds as i64
    }

    pub fn time_saved_percent(&self) -> f64 {
        if self.current_duration_seconds == 0 {
            return 0.0;
        }

        self.time_saved_seconds() as f64 * 100.0 / self.current_duration_seconds as f64
    }
}
