mod decision;
mod poller;

pub use decision::{
    is_better_route, Breaker, Decision, DecisionConfig, DecisionEngine, DecisionState, Suppression,
    BETTER_ROUTE_THRESHOLD, BREAKER_THRESHOLD, MIN_RECHECK_INTERVAL,
};
pub use poller::{
    PollHandler, PollMode, PollOutcome, PollerConfig, PollingSession, SkipReason, TrafficPoller,
    TrafficReading, TrafficSource, DEFAULT_POLL_INTERVAL,
};

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::entities::{Reason, RouteProposal, RouteQuery, TrafficSnapshot};
use crate::error::{invalid_input_error, Error};
use crate::notify::{Notification, NotificationSurface};

#[derive(Clone, Debug, Serialize)]
pub struct SessionStatus {
    pub route_id: u32,
    pub query: RouteQuery,
    pub interval_ms: u64,
    pub last_snapshot: Option<TrafficSnapshot>,
    pub consecutive_error_count: u32,
    pub decision_state: &'static str,
    pub breaker_open: bool,
    pub pending_proposal: Option<RouteProposal>,
}

struct CoreState {
    decision: DecisionEngine,
    pending: Option<RouteProposal>,
    /// `(reason, alternative route id)` of the last dismissed proposal.
    dismissed: Option<(Reason, u32)>,
}

/// Bridges poll results into the decision engine and the notification surface.
struct SessionCore {
    state: Mutex<CoreState>,
    notifier: Arc<dyn NotificationSurface>,
}

impl SessionCore {
    fn new(notifier: Arc<dyn NotificationSurface>, config: DecisionConfig) -> Self {
        Self {
            state: Mutex::new(CoreState {
                decision: DecisionEngine::new(config),
                pending: None,
                dismissed: None,
            }),
            notifier,
        }
    }
}

impl PollHandler for SessionCore {
    fn is_paused(&self) -> bool {
        self.state.lock().decision.is_breaker_open()
    }

    fn on_update(&self, snapshot: &TrafficSnapshot) {
        self.notifier
            .notify(Notification::TrafficUpdated(snapshot.clone()));
    }

    fn on_success(&self, reading: &TrafficReading) {
        let proposal = {
            let mut state = self.state.lock();
            state.decision.record_success();

            let current = match reading.route() {
                Some(current) => current,
                None => {
                    let err = invalid_input_error(format!(
                        "route {} missing from traffic reading",
                        reading.snapshot.route_id
                    ));
                    state.decision.record_failure(&err);
                    return;
                }
            };

            let decision =
                match state
                    .decision
                    .evaluate(current, &reading.snapshot, &reading.candidates)
                {
                    Ok(decision) => decision,
                    Err(err) => {
                        tracing::warn!("route evaluation failed: {}", err);
                        return;
                    }
                };

            let proposal = match decision {
                Decision::Propose(proposal) => proposal,
                Decision::Suppressed(suppression) => {
                    tracing::debug!("evaluation suppressed: {:?}", suppression);
                    return;
                }
                Decision::NoChange => {
                    // the dismissed condition is over; a recurrence is news again
                    state.dismissed = None;
                    return;
                }
            };

            let key = (proposal.reason, proposal.alternative.route_id);
            let repeated = state.dismissed == Some(key)
                || state
                    .pending
                    .as_ref()
                    .map(|pending| (pending.reason, pending.alternative.route_id) == key)
                    .unwrap_or(false);

            if repeated {
                tracing::debug!("not repeating proposal for route {}", key.1);
                return;
            }

            state.pending = Some(proposal.clone());
            proposal
        };

        self.notifier.notify(Notification::RouteProposed(proposal));
    }

    fn on_failure(&self, err: &Error, _consecutive_errors: u32) {
        self.state.lock().decision.record_failure(err);
    }
}

/// Monitoring state for the currently selected route: polling, decisions and
/// the pending proposal. Dropping the session stops polling.
pub struct MonitorSession {
    poller: TrafficPoller,
    notifier: Arc<dyn NotificationSurface>,
    decision_config: DecisionConfig,
    core: Mutex<Arc<SessionCore>>,
}

impl MonitorSession {
    pub fn new(
        source: Arc<dyn TrafficSource>,
        notifier: Arc<dyn NotificationSurface>,
        poller_config: PollerConfig,
        decision_config: DecisionConfig,
    ) -> Self {
        let core = Arc::new(SessionCore::new(notifier.clone(), decision_config.clone()));

        Self {
            poller: TrafficPoller::new(source, poller_config),
            notifier,
            decision_config,
            core: Mutex::new(core),
        }
    }

    /// Starts monitoring `route_id`, ending any previous session.
    pub fn start(&self, query: RouteQuery, route_id: u32, interval: Duration) -> Result<(), Error> {
        query.validate()?;

        if route_id == 0 {
            return Err(invalid_input_error("route id must be positive"));
        }

        if interval.is_zero() {
            return Err(invalid_input_error("polling interval must be positive"));
        }

        let core = Arc::new(SessionCore::new(
            self.notifier.clone(),
            self.decision_config.clone(),
        ));
        *self.core.lock() = core.clone();

        self.poller.start(query, route_id, interval, core);

        Ok(())
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn is_active(&self) -> bool {
        self.poller.session().is_some()
    }

    /// Polls now, ignoring the recheck spacing and an open breaker. A
    /// successful refresh closes the breaker.
    pub async fn refresh(&self) -> PollOutcome {
        self.poller.poll_now(PollMode::Forced).await
    }

    /// Switches the session to the pending proposal's alternative.
    pub fn accept(&self) -> Result<RouteProposal, Error> {
        let session = self
            .poller
            .session()
            .ok_or_else(|| invalid_input_error("no active session"))?;

        let proposal = {
            let core = self.core.lock();
            let mut state = core.state.lock();
            let proposal = state
                .pending
                .take()
                .ok_or_else(|| invalid_input_error("no pending proposal"))?;
            state.decision.resolve();
            proposal
        };

        tracing::info!(
            "accepted route {} in place of {}",
            proposal.alternative.route_id,
            proposal.current.route_id
        );

        self.start(session.query, proposal.alternative.route_id, session.interval)?;

        Ok(proposal)
    }

    pub fn dismiss(&self) -> Result<RouteProposal, Error> {
        let core = self.core.lock();
        let mut state = core.state.lock();

        let proposal = state
            .pending
            .take()
            .ok_or_else(|| invalid_input_error("no pending proposal"))?;

        state.dismissed = Some((proposal.reason, proposal.alternative.route_id));
        state.decision.resolve();

        tracing::info!("dismissed proposal for route {}", proposal.alternative.route_id);

        Ok(proposal)
    }

    pub fn status(&self) -> Option<SessionStatus> {
        let session = self.poller.session()?;
        let core = self.core.lock();
        let state = core.state.lock();

        Some(SessionStatus {
            route_id: session.route_id,
            query: session.query,
            interval_ms: session.interval.as_millis() as u64,
            last_snapshot: session.last_snapshot,
            consecutive_error_count: session.consecutive_error_count,
            decision_state: state.decision.state().name(),
            breaker_open: state.decision.is_breaker_open(),
            pending_proposal: state.pending.clone(),
        })
    }
}
