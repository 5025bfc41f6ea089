//! Retry controller for single provider calls.
//!
//! Transient failures (see [`LLMError::is_transient`]) are re-issued after the delay
//! configured for the attempt that just failed; permanent failures surface at once.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::LLMError;

/// How often and how patiently a call is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; treated as at least 1.
    pub max_attempts: u32,
    /// Delay after the n-th failed attempt; the last entry repeats.
    pub delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delays: vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delays: Vec<Duration>) -> Self {
        Self {
            max_attempts,
            delays,
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Vec::new())
    }

    /// Delay to wait after the failed attempt with zero-based index `attempt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use llm_relay::retry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(5, vec![Duration::from_millis(10), Duration::from_millis(20)]);
    /// assert_eq!(policy.delay_for(0), Duration::from_millis(10));
    /// assert_eq!(policy.delay_for(1), Duration::from_millis(20));
    /// assert_eq!(policy.delay_for(4), Duration::from_millis(20));
    /// ```
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = (attempt as usize).min(self.delays.len().saturating_sub(1));
        self.delays.get(index).copied().unwrap_or_default()
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of attempts.
///
/// The last error is returned unchanged once attempts are exhausted. Each call is
/// independent; nothing is shared between concurrent invocations.
///
/// # Examples
///
/// ```
/// use llm_relay::error::LLMError;
/// use llm_relay::retry::{with_retry, RetryPolicy};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let value = with_retry(|| async { Ok::<_, LLMError>(42) }, &RetryPolicy::default())
///     .await
///     .unwrap();
/// assert_eq!(value, 42);
/// # });
/// ```
pub async fn with_retry<F, Fut, T>(mut operation: F, policy: &RetryPolicy) -> Result<T, LLMError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LLMError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !error.is_transient() || attempt + 1 >= max_attempts {
                    return Err(error);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient provider failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
