use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use annotation::NluError;

use crate::config::RetryConfig;

/// Errors that may succeed if the same call is made again.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for NluError {
    fn is_transient(&self) -> bool {
        self.is_retryable()
    }
}

/// Capped exponential backoff around calls to the annotation service.
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }

    /// Delay before retry number `retry` (0-based).
    fn delay_for(&self, retry: usize) -> Duration {
        let factor = 2u32.saturating_pow(retry.min(31) as u32);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails permanently, or retries run out.
    pub async fn run<F, Fut, T, E>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let mut retry = 0;
        loop {
            let err = match call().await {
                Ok(value) => {
                    if retry > 0 {
                        info!(operation, attempts = retry + 1, "Call succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                warn!(operation, error = %err, "Permanent failure, not retrying");
                return Err(err);
            }
            if retry >= self.max_retries {
                warn!(operation, attempts = retry + 1, error = %err, "Giving up after max retries");
                return Err(err);
            }

            let delay = self.delay_for(retry);
            warn!(
                operation,
                retry = retry + 1,
                max_retries = self.max_retries,
                backoff_ms = delay.as_millis() as u64,
                error = %err,
                "Transient failure, retrying"
            );
            sleep(delay).await;
            retry += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    enum FakeError {
        Unavailable,
        Rejected,
    }

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl Transient for FakeError {
        fn is_transient(&self) -> bool {
            matches!(self, FakeError::Unavailable)
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, 1, 4);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result = policy
            .run("analyze", || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FakeError::Unavailable)
                } else {
                    Ok("annotated")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "annotated");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let policy = RetryPolicy::new(1, 1, 1);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<(), FakeError> = policy
            .run("analyze", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Unavailable)
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let policy = RetryPolicy::new(3, 1, 4);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<(), FakeError> = policy
            .run("analyze", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FakeError::Rejected)
            })
            .await;

        assert!(matches!(result, Err(FakeError::Rejected)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unauthorized_nlu_call_fails_on_first_attempt() {
        let policy = RetryPolicy::new(2, 1, 4);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<(), NluError> = policy
            .run("nlu_analyze", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NluError::Status {
                    status: 401,
                    body: "invalid api key".to_string(),
                })
            })
            .await;

        assert!(matches!(result, Err(NluError::Status { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let policy = RetryPolicy::new(2, 1, 4);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<(), NluError> = policy
            .run("nlu_analyze", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(NluError::Status {
                    status: 503,
                    body: String::new(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::new(10, 100, 1000);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(4), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(64), Duration::from_millis(1000));
    }
}
