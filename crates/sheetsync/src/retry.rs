//! Exponential-backoff retries for calls against the rate-limited service.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use sheets_connector::errors::SheetsError;
use tracing::{info, warn};

/// Classifies failures for retry purposes.
pub trait Retryable {
    /// True when the failure is expected to resolve on retry.
    fn is_transient(&self) -> bool;
}

impl Retryable for SheetsError {
    fn is_transient(&self) -> bool {
        SheetsError::is_transient(self)
    }
}

impl Retryable for crate::errors::JobError {
    fn is_transient(&self) -> bool {
        match self {
            crate::errors::JobError::Sheets(e) => e.is_transient(),
            _ => false,
        }
    }
}

/// Retry with doubling backoff on transient failures.
///
/// Fatal failures propagate immediately. Backoff is capped and jittered so
/// concurrently scheduled jobs don't fall into synchronized retry storms.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(30);

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(5, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            initial_backoff,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Run `op` until it succeeds, fails fatally, or `max_attempts`
    /// transient failures accumulate; the final error propagates.
    pub async fn execute<T, E, F, Fut>(&self, op_name: &str, mut op: F) -> Result<T, E>
    where
        E: Retryable + fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;
        loop {
            info!(op_name, attempt, max_attempts = self.max_attempts, "attempt");
            match op().await {
                Ok(val) => return Ok(val),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = jittered(backoff.min(self.max_backoff));
                    warn!(
                        op_name,
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "transient failure, backing off",
                    );
                    tokio::time::sleep(delay).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(e) => {
                    warn!(op_name, attempt, error = %e, "giving up");
                    return Err(e);
                }
            }
        }
    }
}

fn jittered(backoff: Duration) -> Duration {
    backoff.mul_f64(rand::rng().random_range(0.5..1.5))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug)]
    struct TestError {
        transient: bool,
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test error (transient: {})", self.transient)
        }
    }

    impl Retryable for TestError {
        fn is_transient(&self) -> bool {
            self.transient
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_transient_retries_until_exhausted() {
        let calls = AtomicU32::new(0);
        let res: Result<(), TestError> = fast_policy(4)
            .execute("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: true }) }
            })
            .await;

        assert!(res.is_err());
        assert_eq!(4, calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fatal_propagates_without_retry() {
        let calls = AtomicU32::new(0);
        let res: Result<(), TestError> = fast_policy(4)
            .execute("op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError { transient: false }) }
            })
            .await;

        assert!(res.is_err());
        assert_eq!(1, calls.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let res: Result<u32, TestError> = fast_policy(5)
            .execute("op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(TestError { transient: true })
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(3, res.unwrap());
        assert_eq!(3, calls.load(Ordering::SeqCst));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let base = Duration::from_secs(2);
        for _ in 0..100 {
            let d = jittered(base);
            assert!(d >= base / 2);
            assert!(d < base * 3 / 2);
        }
    }
}
