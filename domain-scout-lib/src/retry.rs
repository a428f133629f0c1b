//! Retry with exponential backoff and jitter.
//!
//! The policy knows nothing about HTTP: callers hand in an `attempt(n)`
//! future factory and a predicate that says whether an outcome is worth
//! retrying. The last outcome is returned as-is once retries run out.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry budget and delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    /// Upper bound of the uniform random jitter added to each delay
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    /// Three attempts in total, 50ms then 100ms, plus up to 30ms jitter.
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(50),
            max_jitter: Duration::from_millis(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that retries immediately, for tests and offline use.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_jitter: Duration::ZERO,
        }
    }

    /// Deterministic part of the delay after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Full delay including jitter.
    fn delay(&self, attempt: u32) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.backoff(attempt) + Duration::from_millis(jitter)
    }

    /// Run `attempt` until it yields a non-retryable outcome or the budget is spent.
    ///
    /// `attempt` receives the 0-based attempt number.
    pub async fn run<T, F, Fut, R>(&self, mut attempt: F, is_retryable: R) -> T
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = T>,
        R: Fn(&T) -> bool,
    {
        let mut n = 0;
        loop {
            let outcome = attempt(n).await;
            if n >= self.max_retries || !is_retryable(&outcome) {
                return outcome;
            }
            let delay = self.delay(n);
            tracing::debug!(attempt = n, delay_ms = delay.as_millis() as u64, "Retrying");
            tokio::time::sleep(delay).await;
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(50));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
    }

    #[test]
    fn test_delay_stays_within_jitter_bound() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay(0);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(80));
        }
    }

    #[tokio::test]
    async fn test_stops_after_max_retries() {
        let calls = AtomicU32::new(0);
        let outcome = RetryPolicy::immediate(2)
            .run(
                |n| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { n }
                },
                |_| true,
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcome, 2);
    }

    #[tokio::test]
    async fn test_returns_first_non_retryable_outcome() {
        let calls = AtomicU32::new(0);
        let outcome = RetryPolicy::immediate(2)
            .run(
                |n| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { if n == 0 { 503 } else { 404 } }
                },
                |code| *code == 503,
            )
            .await;

        assert_eq!(outcome, 404);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_first_attempt_is_not_repeated() {
        let calls = AtomicU32::new(0);
        let _ = RetryPolicy::immediate(2)
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { 200 }
                },
                |code| *code == 503,
            )
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
