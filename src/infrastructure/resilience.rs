//! Timeout and single-retry policy for upstream calls.
//!
//! Every attempt gets its own deadline; a timed-out attempt is dropped, which
//! aborts the in-flight request. Any failure is retried once after a fixed
//! delay, and a second failure is returned as-is. There is no exponential
//! backoff and no circuit breaker.

use crate::domain::QuoteError;
use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::warn;

/// Per-attempt timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 6500;

/// Pause before the single retry in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;

/// Extra attempts after the first failure
const MAX_RETRIES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout: Duration,
    retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
            Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    pub fn new(timeout: Duration, retry_delay: Duration) -> Self {
        Self {
            timeout,
            retry_delay,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `operation` under the policy.
    ///
    /// `operation` is invoked once per attempt and must build a fresh request
    /// each time.
    pub async fn run<T, F, Fut>(&self, upstream: &str, mut operation: F) -> Result<T, QuoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, QuoteError>>,
    {
        let timeout = self.timeout;
        let strategy = FixedInterval::new(self.retry_delay).take(MAX_RETRIES);
        let mut attempt = 0usize;

        Retry::spawn(strategy, || {
            attempt += 1;
            let current = attempt;
            let call = operation();
            async move {
                let result = match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(QuoteError::Timeout(timeout.as_millis() as u64)),
                };
                if let Err(e) = &result {
                    warn!(upstream, attempt = current, "Upstream attempt failed: {}", e);
                }
                result
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(50), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result = fast_policy()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, QuoteError>(7)
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_failure_is_retried_once() {
        let calls = AtomicUsize::new(0);
        let result = fast_policy()
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(QuoteError::Network("connection refused".into()))
                } else {
                    Ok("body")
                }
            })
            .await;

        assert_eq!(result, Ok("body"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_failure_propagates() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast_policy()
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(QuoteError::Network(format!("attempt {}", n + 1)))
            })
            .await;

        assert_eq!(result, Err(QuoteError::Network("attempt 2".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_attempts_time_out() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast_policy()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(())
            })
            .await;

        assert_eq!(result, Err(QuoteError::Timeout(50)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
