mod location;
mod proposal;
mod route;
mod traffic;

pub use location::Coordinates;
pub use proposal::{Estimate, Reason, RouteProposal};
pub use route::{Durations, RouteCandidate, RouteKey, RouteQuery, TravelMode};
pub use traffic::{delay_minutes, CongestionLevel, TrafficSnapshot};
