use std::future::Future;
use std::time::Duration;

use crate::error::Error;

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY: Duration = Duration::from_millis(1_000);

/// Decides which failures are worth another attempt, and how many.
///
/// The delay between attempts is fixed: no jitter and no exponential growth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
    pub retryable_statuses: Vec<u16>,
    pub retry_network: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::routes()
    }
}

impl RetryPolicy {
    /// Directions lookups: rate limiting and server unavailability.
    pub fn routes() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            delay: RETRY_DELAY,
            retryable_statuses: vec![429, 500, 503],
            retry_network: true,
        }
    }

    /// Traffic lookups also tolerate gateway errors since they run in the background.
    pub fn traffic() -> Self {
        Self {
            retryable_statuses: vec![429, 500, 502, 503, 504],
            ..Self::routes()
        }
    }

    pub fn is_retryable(&self, err: &Error) -> bool {
        if err.is_network_error() {
            return self.retry_network;
        }

        err.is_upstream_transient_error()
            && err
                .status
                .map(|status| self.retryable_statuses.contains(&status))
                .unwrap_or(false)
    }
}

/// Issues `request` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. Status-code and network failures share one budget.
pub async fn fetch<T, F, Fut>(policy: &RetryPolicy, mut request: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut retries_left = policy.max_retries;
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let err = match request().await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if !policy.is_retryable(&err) {
            tracing::debug!("attempt {} failed with non-retryable error: {}", attempt, err);
            return Err(err);
        }

        if retries_left == 0 {
            tracing::warn!("giving up after {} attempts: {}", attempt, err);
            return Err(Error {
                message: format!("{} (after {} attempts)", err.message, attempt),
                ..err
            });
        }

        retries_left -= 1;

        tracing::warn!(
            "attempt {} failed: {}, retrying in {}ms ({} retries left)",
            attempt,
            err,
            policy.delay.as_millis(),
            retries_left
        );

        tokio::time::sleep(policy.delay).await;
    }
}
