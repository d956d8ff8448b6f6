//! Fixed-delay retry policy for provider calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::RankError;

/// How many times to try a provider call and how long to wait between tries.
/// No backoff, no jitter: the provider only needs a steady pace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Returned when every attempt failed.
#[derive(Debug)]
pub struct RetryExhausted {
    pub attempts: u32,
    pub last_error: RankError,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Task submission: 3 attempts, 60s apart.
    pub fn submit_default() -> Self {
        Self::new(3, Duration::from_secs(60))
    }

    /// Report polling: 5 attempts, 60s apart.
    pub fn poll_default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }

    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Run `op` until it succeeds or the budget is spent. The delay separates
    /// attempts; nothing is slept after the last one.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, RankError>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= self.max_attempts => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                Err(err) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = self.delay.as_secs(),
                        error = %err,
                        "Attempt failed, retrying"
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn shape_error() -> RankError {
        RankError::UnexpectedResponseShape { field: "report_id" }
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = Cell::new(0);
        let result = RetryPolicy::immediate(5)
            .run("test", |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err(shape_error())
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn exhausts_budget_and_keeps_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run("test", |_| {
                calls.set(calls.get() + 1);
                async { Err(shape_error()) }
            })
            .await;
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(calls.get(), 3);
        assert!(matches!(
            exhausted.last_error,
            RankError::UnexpectedResponseShape { field: "report_id" }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_attempts_only() {
        let start = tokio::time::Instant::now();
        let result: Result<(), _> = RetryPolicy::new(3, Duration::from_secs(60))
            .run("test", |_| async { Err(shape_error()) })
            .await;
        assert!(result.is_err());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(120));
        assert!(elapsed < Duration::from_secs(180));
    }

    #[test]
    fn budget_is_at_least_one() {
        assert_eq!(RetryPolicy::immediate(0).max_attempts, 1);
        assert_eq!(RetryPolicy::submit_default().max_attempts, 3);
        assert_eq!(RetryPolicy::poll_default().max_attempts, 5);
    }
}
