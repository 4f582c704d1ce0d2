//! Retry with exponential backoff around a single logical request.
//!
//! Each attempt ends in one of four ways: success, a 403 that trips the
//! shared [`RateLimitFlag`], a transient status that is retried after a
//! doubling pause, or a failure that is reported as a message.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{ErrorClass, FetchError, FetchOutcome};
use crate::flag::RateLimitFlag;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Pause before the first retry; doubled after each one.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay_ms: 500 }
    }
}

/// Budget and pause for one logical request. Never shared between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    remaining: u32,
    backoff: Duration,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self { remaining: policy.max_retries, backoff: Duration::from_millis(policy.base_delay_ms) }
    }

    pub fn remaining(&self) -> u32 { self.remaining }

    /// Spend one retry: returns the pause to take now, or `None` when exhausted.
    pub fn next_wait(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let wait = self.backoff;
        self.backoff = self.backoff.saturating_mul(2);
        Some(wait)
    }
}

#[derive(Debug, Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    flag: RateLimitFlag,
}

impl Retrier {
    pub fn new(policy: RetryPolicy, flag: RateLimitFlag) -> Self {
        Self { policy, flag }
    }

    pub fn flag(&self) -> &RateLimitFlag { &self.flag }

    pub fn policy(&self) -> &RetryPolicy { &self.policy }

    /// Run `request` until it succeeds, is rate limited, or fails for good.
    ///
    /// `request` is called once per attempt and must build a fresh request
    /// each time.
    pub async fn invoke<T, F, Fut>(&self, mut request: F) -> FetchOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let mut state = RetryState::new(&self.policy);
        let mut attempt = 1u32;
        loop {
            let err = match request().await {
                Ok(v) => {
                    if attempt > 1 {
                        info!(attempt, "request succeeded after retry");
                    }
                    return FetchOutcome::Success(v);
                }
                Err(err) => err,
            };
            match err.class() {
                ErrorClass::RateLimited => {
                    if self.flag.trip() {
                        warn!(status = ?err.status(), "GitHub API refused the request; rate limited for the rest of this process");
                    }
                    return FetchOutcome::RateLimited;
                }
                ErrorClass::Transient => match state.next_wait() {
                    Some(wait) => {
                        debug!(attempt, status = ?err.status(), wait_ms = wait.as_millis() as u64, "transient failure, backing off");
                        sleep(wait).await;
                        attempt += 1;
                    }
                    None => {
                        debug!(attempt, error = %err, "retries exhausted");
                        return FetchOutcome::Failed(err.to_string());
                    }
                },
                ErrorClass::Other => {
                    debug!(attempt, error = %err, "request failed");
                    return FetchOutcome::Failed(err.to_string());
                }
            }
        }
    }
}
