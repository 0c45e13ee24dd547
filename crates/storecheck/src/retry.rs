//! Retry with exponential backoff.
//!
//! Attempt counters live inside each call, so nested or concurrent retries
//! never share state. The last error is returned unchanged.

use crate::context::BrowserSession;
use crate::locator::Selector;
use crate::result::{CheckError, CheckResult};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub max_attempts: u32,
    /// Wait after the first failure
    pub initial_delay: Duration,
    /// Growth per further failure
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` tries (clamped to 1) starting at `initial_delay`
    #[must_use]
    pub const fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            initial_delay,
            factor: 2,
        }
    }

    /// Constant delay between attempts
    #[must_use]
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let mut policy = Self::new(max_attempts, delay);
        policy.factor = 1;
        policy
    }

    /// Use a different growth factor
    #[must_use]
    pub const fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor;
        self
    }

    /// Wait after the `failures`-th failure (1-based):
    /// `initial_delay * factor^(failures - 1)`, saturating
    #[must_use]
    pub fn delay_for(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let multiplier = self.factor.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(multiplier)
    }
}

/// Run `op` until it succeeds or the attempts run out
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(policy, |_: &E| true, op).await
}

/// Like [`retry`] but only errors accepted by `should_retry` trigger another
/// attempt; the rest are returned at once
pub async fn retry_if<T, E, P, F, Fut>(policy: RetryPolicy, should_retry: P, mut op: F) -> Result<T, E>
where
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max = policy.max_attempts.max(1);
    let mut failures = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                failures += 1;
                if failures >= max || !should_retry(&e) {
                    return Err(e);
                }
                let delay = policy.delay_for(failures);
                warn!(attempt = failures, max, error = %e, delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), "retrying");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Retry only errors that [`CheckError::is_retryable`] accepts
pub async fn retry_check<T, F, Fut>(policy: RetryPolicy, op: F) -> CheckResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckResult<T>>,
{
    retry_if(policy, CheckError::is_retryable, op).await
}

/// Re-read the first match's trimmed text until it equals `expected`
///
/// Reads up to `max_retries + 1` times, one second apart; the final
/// mismatch is an assertion failure.
pub async fn verify_text_with_retry(
    session: &BrowserSession,
    selector: &Selector,
    expected: &str,
    max_retries: u32,
) -> CheckResult<()> {
    let policy = RetryPolicy::fixed(max_retries.saturating_add(1), Duration::from_millis(1000));
    retry_check(policy, || async move {
        let actual = session.text(selector).await?;
        debug!(%selector, actual, expected, "verify text");
        if actual == expected {
            Ok(())
        } else {
            Err(CheckError::assertion(format!(
                "expected {selector} text {expected:?}, got {actual:?}"
            )))
        }
    })
    .await
}
