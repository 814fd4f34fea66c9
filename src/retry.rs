//! Bounded retry with exponential backoff.
//!
//! [`with_retry`] wraps any fallible async operation. Attempts run strictly one
//! after another; between attempts the calling task sleeps on the tokio timer,
//! which suspends only that task. The executor never looks at the error to
//! decide whether to retry. Callers that want that behavior use [`retry_if`]
//! together with [`is_retryable_error`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::error::PrismError;

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_exponential_backoff() -> bool {
    true
}

fn default_max_delay_ms() -> u64 {
    10_000
}

/// Retry budget and backoff schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_exponential_backoff")]
    pub exponential_backoff: bool,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            exponential_backoff: default_exponential_backoff(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = duration_to_millis(delay);
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = duration_to_millis(delay);
        self
    }

    pub fn exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-based).
    ///
    /// With backoff: `min(initial * 2^attempt, max)`. Without: `initial`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return Duration::from_millis(self.initial_delay_ms);
        }
        let delay = 2u64
            .checked_pow(attempt)
            .and_then(|factor| self.initial_delay_ms.checked_mul(factor))
            .unwrap_or(u64::MAX);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

/// Whole milliseconds of `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Run `operation` until it succeeds or the retry budget is spent.
///
/// The final error is returned unchanged.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    run(policy, operation, |_| true, |_, _| {}).await
}

/// Like [`with_retry`], calling `on_retry(attempt, &error)` before each backoff
/// sleep. `attempt` is the 1-based number of the attempt that just failed.
pub async fn with_retry_notify<T, E, F, Fut, N>(
    policy: &RetryPolicy,
    operation: F,
    on_retry: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    N: FnMut(u32, &E),
{
    run(policy, operation, |_| true, on_retry).await
}

/// Retry only while `should_retry` accepts the error; other errors are
/// returned at once.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: FnMut(&E) -> bool,
{
    run(policy, operation, should_retry, |_, _| {}).await
}

async fn run<T, E, F, Fut, P, N>(
    policy: &RetryPolicy,
    mut operation: F,
    mut should_retry: P,
    mut on_retry: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: FnMut(&E) -> bool,
    N: FnMut(u32, &E),
{
    let mut attempt = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= policy.max_retries {
            if policy.max_retries > 0 {
                error!(
                    "operation failed after {} attempts: {err}",
                    attempt + 1
                );
            }
            return Err(err);
        }
        if !should_retry(&err) {
            return Err(err);
        }

        let delay = policy.delay_for_attempt(attempt);
        warn!(
            "attempt {}/{} failed: {err}; retrying in {delay:?}",
            attempt + 1,
            policy.max_retries + 1
        );
        on_retry(attempt + 1, &err);
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

const TRANSIENT_SIGNATURES: &[&str] = &[
    "timeout",
    "timed out",
    "etimedout",
    "econnreset",
    "econnrefused",
    "connection reset",
    "connection refused",
    "connection closed",
    "network",
    "socket hang up",
    "bad gateway",
    "service unavailable",
    "gateway timeout",
    "too many requests",
    "rate limit",
    "502",
    "503",
    "504",
    "429",
];

/// Whether a message looks like a transient failure.
pub fn is_transient_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TRANSIENT_SIGNATURES.iter().any(|sig| message.contains(sig))
}

/// Advisory classification of transient errors.
///
/// Validation errors are never transient. Backend and provider errors are
/// transient when their message or code matches a known signature (timeouts,
/// connection resets, gateway errors, rate limiting).
pub fn is_retryable_error(err: &PrismError) -> bool {
    match err {
        PrismError::Search { message, code } => {
            is_transient_message(message) || code.as_deref().is_some_and(is_transient_message)
        }
        PrismError::Embedding(message) => is_transient_message(message),
        _ => false,
    }
}
