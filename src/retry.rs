//! Retry policy for transient failures.
//!
//! The policy is a pure function of the failure and how many retries the
//! logical request has already used. It never sleeps itself; the client
//! awaits the returned delay.

use crate::Error;
use rand::Rng;
use std::time::Duration;

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait for the delay, then re-dispatch with the retry counter incremented.
    RetryAfter(Duration),
    /// Surface the failure to the caller.
    GiveUp,
}

/// Exponential backoff with additive jitter.
///
/// The delay before retry `n` (1-indexed) is
/// `min(base_delay * 2^n, max_delay) + uniform[0, jitter)`.
///
/// # Examples
///
/// ```
/// use nids_client::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries, 3);
///
/// // First retry waits 2s plus up to 1s of jitter.
/// let delay = policy.delay_for_retry(1);
/// assert!(delay >= Duration::from_millis(2000));
/// assert!(delay < Duration::from_millis(3000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
    /// Base unit of the exponential curve.
    pub base_delay: Duration,
    /// Cap applied before jitter is added.
    pub max_delay: Duration,
    /// Upper bound (exclusive) of the random extra delay.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Decides whether the failed attempt should be retried.
    ///
    /// `retry_count` is the number of retries already performed for this
    /// logical request (0 after the initial attempt).
    pub fn decide(&self, error: &Error, retry_count: u32) -> RetryDecision {
        if !error.is_retryable() || retry_count >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        RetryDecision::RetryAfter(self.delay_for_retry(retry_count + 1))
    }

    /// Returns the delay before retry `n` (1-indexed), jitter included.
    pub fn delay_for_retry(&self, n: u32) -> Duration {
        let delay = self.backoff(n);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }

    /// The deterministic part of the delay before retry `n`.
    pub fn backoff(&self, n: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(n);
        self.base_delay.saturating_mul(multiplier).min(self.max_delay)
    }
}
