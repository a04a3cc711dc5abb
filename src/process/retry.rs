// src/process/retry.rs

use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use super::lookup::{Attempt, Lookup, Outcome, Reason};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(1);

/// Exponential backoff with jitter, applied only to `Attempt::Retryable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random jitter added to each wait.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Done(Outcome),
    RetryAfter(Duration),
}

impl RetryPolicy {
    /// No waiting between attempts. Used by tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Wait before the next call, given how many calls have been made.
    /// `jitter` is a fraction in [0, 1) of `max_jitter`.
    pub fn delay(&self, attempts_made: u32, jitter: f64) -> Duration {
        let exp = attempts_made.saturating_sub(1).min(16);
        let backoff = self
            .base_delay
            .checked_mul(2u32.pow(exp))
            .unwrap_or(Duration::MAX);
        let jitter =
            Duration::try_from_secs_f64(self.max_jitter.as_secs_f64() * jitter.clamp(0.0, 1.0))
                .unwrap_or(Duration::MAX);
        backoff.saturating_add(jitter)
    }

    /// Pure decision over the latest attempt.
    pub fn decide(&self, attempts_made: u32, attempt: Attempt, jitter: f64) -> Decision {
        match attempt {
            Attempt::Found(record) => Decision::Done(Outcome::Found(record)),
            Attempt::NotFound => Decision::Done(Outcome::Unresolved(Reason::NotFound)),
            Attempt::Terminal(msg) => Decision::Done(Outcome::Unresolved(Reason::Failed(msg))),
            Attempt::Retryable(_) if attempts_made >= self.max_attempts => {
                Decision::Done(Outcome::Unresolved(Reason::Exhausted {
                    attempts: attempts_made,
                }))
            }
            Attempt::Retryable(_) => Decision::RetryAfter(self.delay(attempts_made, jitter)),
        }
    }
}

/// Call `lookup` for `key` until the policy says stop. Never fails.
#[instrument(level = "debug", skip(policy, lookup))]
pub async fn resolve(policy: &RetryPolicy, lookup: &dyn Lookup, key: &str) -> Outcome {
    let mut attempts_made = 0;
    loop {
        let attempt = lookup.lookup(key).await;
        attempts_made += 1;

        if let Attempt::Retryable(msg) = &attempt {
            warn!(%key, attempt = attempts_made, error = %msg, "server busy");
        }

        let jitter = rand::thread_rng().gen::<f64>();
        match policy.decide(attempts_made, attempt, jitter) {
            Decision::Done(outcome) => {
                debug!(%key, attempts = attempts_made, ?outcome, "resolved");
                return outcome;
            }
            Decision::RetryAfter(wait) => {
                debug!(%key, delay_ms = wait.as_millis() as u64, "backing off");
                sleep(wait).await;
            }
        }
    }
}
