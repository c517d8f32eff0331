use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::cache::TRAFFIC_CACHE_TTL;
use crate::entities::{RouteCandidate, RouteQuery, TrafficSnapshot};
use crate::error::Error;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(60_000);

/// A traffic read for one route, together with the candidates of the search
/// it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct TrafficReading {
    pub snapshot: TrafficSnapshot,
    pub candidates: Vec<RouteCandidate>,
    pub from_cache: bool,
}

impl TrafficReading {
    pub fn route(&self) -> Option<&RouteCandidate> {
        self.candidates
            .iter()
            .find(|candidate| candidate.route_id == self.snapshot.route_id)
    }
}

#[async_trait]
pub trait TrafficSource: Send + Sync {
    async fn traffic(&self, query: &RouteQuery, route_id: u32) -> Result<TrafficReading, Error>;
}

/// Receives the results of a polling session.
///
/// Callbacks run while the session is locked and must not call back into the
/// poller. Once `stop()` has returned none of them runs again.
pub trait PollHandler: Send + Sync {
    /// Scheduled ticks are skipped while this returns true.
    fn is_paused(&self) -> bool {
        false
    }

    /// Called when the snapshot differs from the previous one.
    fn on_update(&self, snapshot: &TrafficSnapshot);

    /// Called after every applied poll, changed or not, after `on_update`.
    fn on_success(&self, _reading: &TrafficReading) {}

    fn on_failure(&self, _err: &Error, _consecutive_errors: u32) {}
}

#[derive(Clone, Debug)]
pub struct PollerConfig {
    /// Minimum spacing between two scheduled checks.
    pub min_recheck_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            min_recheck_interval: TRAFFIC_CACHE_TTL,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PollingSession {
    pub query: RouteQuery,
    pub route_id: u32,
    pub interval: Duration,
    pub last_snapshot: Option<TrafficSnapshot>,
    pub consecutive_error_count: u32,
    pub last_check_at: Option<Instant>,
    in_flight: bool,
    stopped: bool,
    issued_token: u64,
    applied_token: u64,
}

impl PollingSession {
    fn new(query: RouteQuery, route_id: u32, interval: Duration) -> Self {
        Self {
            query,
            route_id,
            interval,
            last_snapshot: None,
            consecutive_error_count: 0,
            last_check_at: None,
            in_flight: false,
            stopped: false,
            issued_token: 0,
            applied_token: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollMode {
    Scheduled,
    /// Ignores the recheck spacing and the handler's pause.
    Forced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Stopped,
    InFlight,
    TooSoon,
    Paused,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    Skipped(SkipReason),
    Unchanged,
    Updated(TrafficSnapshot),
    Failed(Error),
    /// A result that arrived after the session was stopped or superseded.
    StaleDiscarded,
}

struct Shared {
    session: Mutex<PollingSession>,
    source: Arc<dyn TrafficSource>,
    handler: Arc<dyn PollHandler>,
    min_recheck_interval: Duration,
}

impl Shared {
    async fn poll(&self, mode: PollMode) -> PollOutcome {
        if mode == PollMode::Scheduled && self.handler.is_paused() {
            return PollOutcome::Skipped(SkipReason::Paused);
        }

        let (query, route_id, token) = {
            let mut session = self.session.lock();

            if session.stopped {
                return PollOutcome::Skipped(SkipReason::Stopped);
            }

            if session.in_flight {
                return PollOutcome::Skipped(SkipReason::InFlight);
            }

            if mode == PollMode::Scheduled {
                if let Some(last_check_at) = session.last_check_at {
                    if last_check_at.elapsed() < self.min_recheck_interval {
                        return PollOutcome::Skipped(SkipReason::TooSoon);
                    }
                }
            }

            session.in_flight = true;
            session.last_check_at = Some(Instant::now());
            session.issued_token += 1;

            (session.query.clone(), session.route_id, session.issued_token)
        };

        let result = self.source.traffic(&query, route_id).await;

        let mut session = self.session.lock();
        session.in_flight = false;

        if session.stopped || token <= session.applied_token {
            tracing::debug!("discarding stale traffic result for route {}", route_id);
            return PollOutcome::StaleDiscarded;
        }

        match result {
            Ok(reading) => {
                if reading.snapshot.route_id != session.route_id {
                    tracing::debug!(
                        "discarding traffic for route {} in session for route {}",
                        reading.snapshot.route_id,
                        session.route_id
                    );
                    return PollOutcome::StaleDiscarded;
                }

                session.applied_token = token;
                session.consecutive_error_count = 0;

                let changed = match &session.last_snapshot {
                    Some(last) => !last.same_conditions(&reading.snapshot),
                    None => true,
                };

                if changed {
                    session.last_snapshot = Some(reading.snapshot.clone());
                }

                // the session stays locked through the callbacks so that a
                // concurrent stop() waits for them instead of racing them
                if changed {
                    self.handler.on_update(&reading.snapshot);
                }

                self.handler.on_success(&reading);
                drop(session);

                if changed {
                    PollOutcome::Updated(reading.snapshot)
                } else {
                    PollOutcome::Unchanged
                }
            }
            Err(err) => {
                session.consecutive_error_count += 1;
                let count = session.consecutive_error_count;

                tracing::warn!(
                    "traffic poll for route {} failed ({} in a row): {}",
                    route_id,
                    count,
                    err
                );

                self.handler.on_failure(&err, count);
                drop(session);

                PollOutcome::Failed(err)
            }
        }
    }
}

struct Active {
    shared: Arc<Shared>,
    handle: JoinHandle<()>,
}

/// Periodically reads traffic for one route. Starting a new session ends the
/// previous one.
pub struct TrafficPoller {
    source: Arc<dyn TrafficSource>,
    config: PollerConfig,
    active: Mutex<Option<Active>>,
}

impl TrafficPoller {
    pub fn new(source: Arc<dyn TrafficSource>, config: PollerConfig) -> Self {
        Self {
            source,
            config,
            active: Mutex::new(None),
        }
    }

    /// Starts polling. The first check fires immediately.
    #[tracing::instrument(skip(self, query, handler))]
    pub fn start(
        &self,
        query: RouteQuery,
        route_id: u32,
        interval: Duration,
        handler: Arc<dyn PollHandler>,
    ) {
        let shared = Arc::new(Shared {
            session: Mutex::new(PollingSession::new(query, route_id, interval)),
            source: self.source.clone(),
            handler,
            min_recheck_interval: self.config.min_recheck_interval,
        });

        let task_shared = shared.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                if task_shared.session.lock().stopped {
                    break;
                }

                task_shared.poll(PollMode::Scheduled).await;
            }
        });

        let previous = self.active.lock().replace(Active { shared, handle });

        if let Some(previous) = previous {
            Self::halt(previous);
        }

        tracing::info!("polling traffic every {}ms", interval.as_millis());
    }

    pub fn stop(&self) {
        if let Some(active) = self.active.lock().take() {
            Self::halt(active);
        }
    }

    fn halt(active: Active) {
        let route_id = {
            let mut session = active.shared.session.lock();
            session.stopped = true;
            session.route_id
        };

        active.handle.abort();

        tracing::info!("stopped polling route {}", route_id);
    }

    /// Runs one check outside the schedule.
    pub async fn poll_now(&self, mode: PollMode) -> PollOutcome {
        let shared = match self.active.lock().as_ref() {
            Some(active) => active.shared.clone(),
            None => return PollOutcome::Skipped(SkipReason::Stopped),
        };

        shared.poll(mode).await
    }

    pub fn session(&self) -> Option<PollingSession> {
        self.active
            .lock()
            .as_ref()
            .map(|active| active.shared.session.lock().clone())
    }
}

impl Drop for TrafficPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
