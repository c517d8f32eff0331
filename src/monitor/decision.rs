use std::time::Duration;
use tokio::time::Instant;

use crate::entities::{CongestionLevel, Estimate, Reason, RouteCandidate, RouteProposal, TrafficSnapshot};
use crate::error::{invalid_input_error, Error};

pub const MIN_RECHECK_INTERVAL: Duration = Duration::from_millis(60_000);
pub const BREAKER_THRESHOLD: u32 = 3;
pub const BETTER_ROUTE_THRESHOLD: f64 = 0.10;
pub const INCIDENT_DELAY_MINUTES: u64 = 15;
pub const CONGESTION_ASSUMED_SAVINGS: Duration = Duration::from_secs(10 * 60);
pub const INCIDENT_ASSUMED_SAVINGS: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Debug)]
pub struct DecisionConfig {
    pub min_recheck_interval: Duration,
    pub breaker_threshold: u32,
    pub better_route_threshold: f64,
    pub incident_delay_minutes: u64,
    pub congestion_assumed_savings: Duration,
    pub incident_assumed_savings: Duration,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            min_recheck_interval: MIN_RECHECK_INTERVAL,
            breaker_threshold: BREAKER_THRESHOLD,
            better_route_threshold: BETTER_ROUTE_THRESHOLD,
            incident_delay_minutes: INCIDENT_DELAY_MINUTES,
            congestion_assumed_savings: CONGESTION_ASSUMED_SAVINGS,
            incident_assumed_savings: INCIDENT_ASSUMED_SAVINGS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionState {
    Idle,
    Evaluating,
    Proposed,
    ErrorAccumulating,
    BreakerOpen,
}

impl DecisionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Evaluating => "evaluating",
            Self::Proposed => "proposed",
            Self::ErrorAccumulating => "error_accumulating",
            Self::BreakerOpen => "breaker_open",
        }
    }
}

/// Counts consecutive failures; open once the threshold is reached, closed
/// again only by an explicit reset.
#[derive(Clone, Debug)]
pub struct Breaker {
    threshold: u32,
    consecutive_failures: u32,
}

impl Breaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_failures: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.consecutive_failures >= self.threshold
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Returns true if this failure opened the breaker.
    pub fn record_failure(&mut self) -> bool {
        let was_open = self.is_open();
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        !was_open && self.is_open()
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suppression {
    Cooldown,
    BreakerOpen,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    Suppressed(Suppression),
    NoChange,
    Propose(RouteProposal),
}

/// `alternative` is at least `threshold` (fraction) faster than `current`.
pub fn is_better_route(current_seconds: u64, alternative_seconds: u64, threshold: f64) -> bool {
    current_seconds > 0 && (alternative_seconds as f64) <= current_seconds as f64 * (1.0 - threshold)
}

fn fastest<'a>(
    alternatives: &'a [RouteCandidate],
    current: &RouteCandidate,
    toll: bool,
) -> Option<&'a RouteCandidate> {
    alternatives
        .iter()
        .filter(|candidate| candidate.route_id != current.route_id)
        .filter(|candidate| candidate.is_toll_road == toll)
        .min_by_key(|candidate| candidate.traffic_duration_seconds())
}

/// Decides when to surface an alternate route for the session's current route.
#[derive(Clone, Debug)]
pub struct DecisionEngine {
    config: DecisionConfig,
    state: DecisionState,
    breaker: Breaker,
    last_evaluated_at: Option<Instant>,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            breaker: Breaker::new(config.breaker_threshold),
            config,
            state: DecisionState::Idle,
            last_evaluated_at: None,
        }
    }

    pub fn state(&self) -> DecisionState {
        self.state
    }

    pub fn breaker(&self) -> &Breaker {
        &self.breaker
    }

    pub fn is_breaker_open(&self) -> bool {
        self.breaker.is_open()
    }

    /// Applies the congestion rules to a fresh snapshot of `current`.
    ///
    /// `alternatives` are the other candidates of the same search; the toll and
    /// incident proposals estimate their gain with a fixed assumed saving.
    #[tracing::instrument(skip_all, fields(route_id = current.route_id))]
    pub fn evaluate(
        &mut self,
        current: &RouteCandidate,
        snapshot: &TrafficSnapshot,
        alternatives: &[RouteCandidate],
    ) -> Result<Decision, Error> {
        if self.breaker.is_open() {
            return Ok(Decision::Suppressed(Suppression::BreakerOpen));
        }

        if let Some(last) = self.last_evaluated_at {
            if last.elapsed() < self.config.min_recheck_interval {
                return Ok(Decision::Suppressed(Suppression::Cooldown));
            }
        }

        self.state = DecisionState::Evaluating;
        self.last_evaluated_at = Some(Instant::now());

        if snapshot.route_id != current.route_id {
            let err = invalid_input_error(format!(
                "snapshot for route {} evaluated against route {}",
                snapshot.route_id, current.route_id
            ));
            self.record_failure(&err);
            return Err(err);
        }

        let decision = self.apply_rules(current, snapshot, alternatives);

        self.breaker.reset();
        self.state = match decision {
            Decision::Propose(_) => DecisionState::Proposed,
            _ => DecisionState::Idle,
        };

        Ok(decision)
    }

    fn apply_rules(
        &self,
        current: &RouteCandidate,
        snapshot: &TrafficSnapshot,
        alternatives: &[RouteCandidate],
    ) -> Decision {
        let heavy = snapshot.congestion == CongestionLevel::Heavy;
        let current_seconds = snapshot.duration_in_traffic_seconds;

        let (reason, toll, assumed_savings) = if !current.is_toll_road && heavy {
            (Reason::Congestion, true, Some(self.config.congestion_assumed_savings))
        } else if heavy && snapshot.delay_minutes > self.config.incident_delay_minutes {
            (Reason::Incident, false, Some(self.config.incident_assumed_savings))
        } else if current.is_toll_road && snapshot.congestion == CongestionLevel::Smooth {
            (Reason::Clear, false, None)
        } else {
            return Decision::NoChange;
        };

        let alternative = match fastest(alternatives, current, toll) {
            Some(alternative) => alternative,
            None => {
                tracing::debug!("no {} alternative for {:?}", if toll { "toll" } else { "free" }, reason);
                return Decision::NoChange;
            }
        };

        let mut current = current.clone();
        current.duration_in_traffic_seconds = Some(current_seconds);

        let proposal = match assumed_savings {
            Some(savings) => RouteProposal::new(
                reason,
                Estimate::Assumed,
                current,
                alternative.clone(),
                current_seconds.saturating_sub(savings.as_secs()),
            ),
            None => RouteProposal::new(
                reason,
                Estimate::Measured,
                current,
                alternative.clone(),
                alternative.traffic_duration_seconds(),
            ),
        };

        tracing::info!(
            "proposing route {} ({:?}, {:?} estimate)",
            proposal.alternative.route_id,
            reason,
            proposal.estimate
        );

        Decision::Propose(proposal)
    }

    /// Compares freshly fetched candidates against `current`; proposes the
    /// fastest one only if it clears the better-route threshold.
    pub fn compare(&self, current: &RouteCandidate, candidates: &[RouteCandidate]) -> Option<RouteProposal> {
        let current_seconds = current.traffic_duration_seconds();

        let best = candidates
            .iter()
            .filter(|candidate| candidate.route_id != current.route_id)
            .min_by_key(|candidate| candidate.traffic_duration_seconds())?;

        let best_seconds = best.traffic_duration_seconds();

        if !is_better_route(current_seconds, best_seconds, self.config.better_route_threshold) {
            return None;
        }

        Some(RouteProposal::new(
            Reason::Faster,
            Estimate::Measured,
            current.clone(),
            best.clone(),
            best_seconds,
        ))
    }

    pub fn record_failure(&mut self, err: &Error) {
        if self.breaker.record_failure() {
            tracing::warn!(
                "breaker opened after {} consecutive failures: {}",
                self.breaker.consecutive_failures(),
                err
            );
        }

        self.state = if self.breaker.is_open() {
            DecisionState::BreakerOpen
        } else {
            DecisionState::ErrorAccumulating
        };
    }

    /// A successful poll; the only way to close an open breaker.
    pub fn record_success(&mut self) {
        if self.breaker.is_open() {
            tracing::info!("breaker closed after successful poll");
        }

        self.breaker.reset();

        if matches!(
            self.state,
            DecisionState::ErrorAccumulating | DecisionState::BreakerOpen
        ) {
            self.state = DecisionState::Idle;
        }
    }

    /// The pending proposal was accepted or dismissed.
    pub fn resolve(&mut self) {
        if self.state == DecisionState::Proposed {
            self.state = DecisionState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Coordinates;
    use chrono::Utc;

    fn route(id: u32, toll: bool, seconds: u64) -> RouteCandidate {
        let route = RouteCandidate::new(id, vec![Coordinates::new(0.0, 0.0)], 10_000, 1200)
            .unwrap()
            .with_traffic(seconds);

        if toll {
            route.with_toll(Some(4.0))
        } else {
            route
        }
    }

    fn snapshot(route: &RouteCandidate) -> TrafficSnapshot {
        TrafficSnapshot::from_route(route, Utc::now())
    }

    fn candidates() -> Vec<RouteCandidate> {
        vec![route(1, false, 2400), route(2, true, 1300), route(3, false, 2000)]
    }

    fn failure() -> Error {
        invalid_input_error("boom")
    }

    #[tokio::test(start_paused = true)]
    async fn heavy_congestion_on_free_road_proposes_toll_alternative() {
        let mut engine = DecisionEngine::default();
        let current = route(1, false, 2400);

        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();

        let proposal = match decision {
            Decision::Propose(proposal) => proposal,
            other => panic!("expected proposal, got {:?}", other),
        };
        assert_eq!(proposal.reason, Reason::Congestion);
        assert_eq!(proposal.estimate, Estimate::Assumed);
        assert!(proposal.alternative.is_toll_road);
        assert_eq!(proposal.current.route_id, 1);
        assert_eq!(proposal.time_saved_seconds(), 600);
        assert_eq!(engine.state(), DecisionState::Proposed);
    }

    #[tokio::test(start_paused = true)]
    async fn smooth_traffic_on_toll_road_reverts_to_free_alternative() {
        let mut engine = DecisionEngine::default();
        let current = route(2, true, 1200);

        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();

        let proposal = match decision {
            Decision::Propose(proposal) => proposal,
            other => panic!("expected proposal, got {:?}", other),
        };
        assert_eq!(proposal.reason, Reason::Clear);
        assert_eq!(proposal.estimate, Estimate::Measured);
        assert!(!proposal.alternative.is_toll_road);
        assert_eq!(proposal.alternative.route_id, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn heavy_delay_on_toll_road_proposes_incident_detour() {
        let mut engine = DecisionEngine::default();
        let current = route(2, true, 2400);

        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();

        match decision {
            Decision::Propose(proposal) => {
                assert_eq!(proposal.reason, Reason::Incident);
                assert!(!proposal.alternative.is_toll_road);
                assert_eq!(proposal.time_saved_seconds(), 900);
            }
            other => panic!("expected proposal, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn moderate_traffic_changes_nothing() {
        let mut engine = DecisionEngine::default();
        let current = route(1, false, 1900);

        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();

        assert_eq!(decision, Decision::NoChange);
        assert_eq!(engine.state(), DecisionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn no_matching_alternative_changes_nothing() {
        let mut engine = DecisionEngine::default();
        let current = route(1, false, 2400);
        let only_free = vec![current.clone(), route(3, false, 2000)];

        let decision = engine.evaluate(&current, &snapshot(&current), &only_free).unwrap();

        assert_eq!(decision, Decision::NoChange);
    }

    #[tokio::test(start_paused = true)]
    async fn second_evaluation_within_cooldown_is_suppressed() {
        let mut engine = DecisionEngine::default();
        let current = route(1, false, 2400);

        let first = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();
        assert!(matches!(first, Decision::Propose(_)));

        tokio::time::advance(Duration::from_secs(59)).await;
        let second = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();
        assert_eq!(second, Decision::Suppressed(Suppression::Cooldown));

        tokio::time::advance(Duration::from_secs(1)).await;
        let third = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();
        assert!(matches!(third, Decision::Propose(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn breaker_opens_after_three_failures_and_stays_open() {
        let mut engine = DecisionEngine::default();
        let current = route(1, false, 2400);

        engine.record_failure(&failure());
        engine.record_failure(&failure());
        assert_eq!(engine.state(), DecisionState::ErrorAccumulating);
        assert!(!engine.is_breaker_open());

        engine.record_failure(&failure());
        assert_eq!(engine.state(), DecisionState::BreakerOpen);

        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();
        assert_eq!(decision, Decision::Suppressed(Suppression::BreakerOpen));

        engine.record_failure(&failure());
        assert_eq!(engine.state(), DecisionState::BreakerOpen);
        assert_eq!(engine.breaker().consecutive_failures(), 4);

        tokio::time::advance(Duration::from_secs(3600)).await;
        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();
        assert_eq!(decision, Decision::Suppressed(Suppression::BreakerOpen));

        engine.record_success();
        assert_eq!(engine.state(), DecisionState::Idle);
        let decision = engine.evaluate(&current, &snapshot(&current), &candidates()).unwrap();
        assert!(matches!(decision, Decision::Propose(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn mismatched_snapshot_counts_as_failure() {
        let mut engine = DecisionEngine::default();
        let current = route(1, false, 2400);
        let other = route(2, true, 1300);

        assert!(engine.evaluate(&current, &snapshot(&other), &candidates()).is_err());
        assert_eq!(engine.breaker().consecutive_failures(), 1);
        assert_eq!(engine.state(), DecisionState::ErrorAccumulating);
    }

    #[test]
    fn better_route_needs_ten_percent() {
        assert!(is_better_route(1000, 900, BETTER_ROUTE_THRESHOLD));
        assert!(!is_better_route(1000, 901, BETTER_ROUTE_THRESHOLD));
        assert!(!is_better_route(0, 0, BETTER_ROUTE_THRESHOLD));
    }

    #[test]
    fn compare_proposes_only_clearly_faster_candidates() {
        let engine = DecisionEngine::default();
        let current = route(1, false, 2000);

        let close = vec![current.clone(), route(2, false, 1850)];
        assert!(engine.compare(&current, &close).is_none());

        let faster = vec![current.clone(), route(2, false, 1850), route(3, true, 1700)];
        let proposal = engine.compare(&current, &faster).unwrap();
        assert_eq!(proposal.reason, Reason::Faster);
        assert_eq!(proposal.alternative.route_id, 3);
        assert_eq!(proposal.time_saved_seconds(), 300);
    }
}
