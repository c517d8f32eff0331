use serde::{Deserialize, Serialize};

use crate::entities::{RouteProposal, TrafficSnapshot};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    TrafficUpdated(TrafficSnapshot),
    RouteProposed(RouteProposal),
}

/// Where traffic updates and alternate-route proposals are presented to the user.
pub trait NotificationSurface: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl NotificationSurface for async_channel::Sender<Notification> {
    fn notify(&self, notification: Notification) {
        if let Err(err) = self.try_send(notification) {
            if err.is_closed() {
                tracing::debug!("notification receiver dropped");
            } else {
                tracing::warn!("notification channel full, dropping notification");
            }
        }
    }
}

/// Surface that only logs, for headless runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSurface;

impl NotificationSurface for LogSurface {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::TrafficUpdated(snapshot) => tracing::info!(
                "route {} traffic {} (+{} min)",
                snapshot.route_id,
                snapshot.congestion.name(),
                snapshot.delay_minutes
            ),
            Notification::RouteProposed(proposal) => tracing::info!(
                "proposing route {} over {} ({:?}, saves {}s / {:.0}%)",
                proposal.alternative.route_id,
                proposal.current.route_id,
                proposal.reason,
                proposal.time_saved_seconds(),
                proposal.time_saved_percent()
            ),
        }
    }
}
