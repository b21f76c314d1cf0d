// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry-on-conflict with exponential backoff.
//!
//! Deployments are also written by the scheduler and other controllers, so a
//! `replace` can be rejected with HTTP 409 when the object changed after it was
//! read. The standard answer is to re-read, re-apply the change and try again.
//!
//! This module splits that idiom in two:
//! - [`RetryPolicy`] - a pure value describing attempts and backoff
//! - [`retry_on_conflict`] - drives an async get-modify-update closure under a
//!   policy, with a caller supplied conflict classifier
//!
//! Neither part knows about Kubernetes, so both are testable without a cluster.

use crate::constants::{
    CONFLICT_RETRY_INITIAL_INTERVAL_MILLIS, CONFLICT_RETRY_MAX_ATTEMPTS,
    CONFLICT_RETRY_MAX_INTERVAL_MILLIS, CONFLICT_RETRY_MULTIPLIER,
    CONFLICT_RETRY_RANDOMIZATION_FACTOR, HTTP_STATUS_CONFLICT,
};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded exponential backoff policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_interval: Duration,
    /// Upper bound for any single delay
    pub max_interval: Duration,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
}

impl Default for RetryPolicy {
    /// Policy used for Deployment updates.
    ///
    /// # Retry Schedule
    ///
    /// 1. immediately
    /// 2. after ~10ms
    /// 3. after ~20ms
    /// 4. after ~40ms
    /// 5. after ~80ms
    ///
    /// Each delay is jittered by ±10% and never exceeds 1 second.
    fn default() -> Self {
        Self {
            max_attempts: CONFLICT_RETRY_MAX_ATTEMPTS,
            initial_interval: Duration::from_millis(CONFLICT_RETRY_INITIAL_INTERVAL_MILLIS),
            max_interval: Duration::from_millis(CONFLICT_RETRY_MAX_INTERVAL_MILLIS),
            multiplier: CONFLICT_RETRY_MULTIPLIER,
            randomization_factor: CONFLICT_RETRY_RANDOMIZATION_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Policy retrying up to `max_attempts` times without any delay.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            multiplier: 1.0,
            randomization_factor: 0.0,
        }
    }

    /// Un-jittered delay after the failed attempt number `attempt` (1-based).
    ///
    /// Returns `None` once `attempt` reaches `max_attempts`.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = secs.min(self.max_interval.as_secs_f64());
        Some(Duration::from_secs_f64(capped.max(0.0)))
    }

    /// Jittered delay after the failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Option<Duration> {
        self.base_delay(attempt)
            .map(|interval| self.apply_jitter(interval))
    }

    /// Apply randomization (jitter) to an interval, never above `max_interval`.
    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 || interval.is_zero() {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let min = secs - delta;
        let max = secs + delta;

        let jittered = rand::rng().random_range(min..=max);

        Duration::from_secs_f64(jittered.max(0.0)).min(self.max_interval)
    }
}

/// Why [`retry_on_conflict`] gave up.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every attempt ended in a conflict
    Exhausted {
        /// Attempts made
        attempts: u32,
        /// The last conflict error
        last: E,
    },
    /// A non-conflict error ended the loop
    Aborted(E),
}

impl<E> RetryError<E> {
    /// The underlying error, whatever the reason.
    pub fn into_inner(self) -> E {
        match self {
            Self::Exhausted { last, .. } => last,
            Self::Aborted(err) => err,
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-conflict error, or the
/// policy runs out of attempts.
///
/// `operation` must perform the whole read-modify-write cycle, so every retry
/// starts from fresh state.
///
/// # Arguments
///
/// * `policy` - Attempts and backoff schedule
/// * `operation_name` - Human-readable name for logging
/// * `is_conflict` - Classifies errors that warrant another attempt
/// * `operation` - The get-modify-update closure
///
/// # Errors
///
/// - [`RetryError::Aborted`] on the first error `is_conflict` rejects
/// - [`RetryError::Exhausted`] when the last allowed attempt still conflicts
pub async fn retry_on_conflict<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_conflict: C,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt, "Operation succeeded after conflict retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !is_conflict(&e) => return Err(RetryError::Aborted(e)),
            Err(e) => match policy.delay(attempt) {
                Some(duration) => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Conflict, will retry"
                    );
                    if !duration.is_zero() {
                        tokio::time::sleep(duration).await;
                    }
                }
                None => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        "Conflict retries exhausted, giving up"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
            },
        }
    }
}

/// `true` if the API server rejected a write because the object changed since
/// it was read (HTTP 409).
#[must_use]
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(api_err) if api_err.code == HTTP_STATUS_CONFLICT)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
