//! Bounded retry with linear backoff
//!
//! A [`RetryPolicy`] runs an async operation up to `max_attempts` times,
//! sleeping `backoff(attempt)` after each failed attempt except the last.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Retry policy: attempt budget plus backoff schedule
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Unit multiplied by the failed attempt number
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts,
            backoff_unit,
        }
    }

    /// Delay to wait after `failed_attempt` (1-based) before trying again
    pub fn backoff(&self, failed_attempt: u32) -> Duration {
        self.backoff_unit * failed_attempt
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. On exhaustion the last error
    /// is returned.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(op = label, attempt, max_attempts, error = %e, "Retries exhausted");
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(
                        op = label,
                        attempt,
                        max_attempts,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Like [`run`](Self::run), but maps exhaustion through `fallback` so the
    /// caller always gets a value.
    pub async fn run_or_else<T, E, F, Fut>(&self, label: &str, op: F, fallback: impl FnOnce(E) -> T) -> T
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        match self.run(label, op).await {
            Ok(value) => value,
            Err(e) => fallback(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_sleeps_between_attempts_only() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<(), String> = RetryPolicy::default()
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("network down".to_string()) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "network down");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after attempt 1, 2s after attempt 2, nothing after attempt 3
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failure() {
        let result = RetryPolicy::default()
            .run("test", |attempt| async move {
                if attempt < 2 {
                    Err("flaky")
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result, Ok(2));
    }

    #[tokio::test]
    async fn test_run_or_else_uses_fallback() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let value = policy
            .run_or_else("test", |_| async { Err::<u32, _>("boom") }, |e| e.len() as u32)
            .await;
        assert_eq!(value, 4);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _ = RetryPolicy::new(0, Duration::ZERO)
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("x") }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
