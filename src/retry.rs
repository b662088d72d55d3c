//! Bounded retry with backoff.
//!
//! Every remote interaction (session establishment and each chat API call)
//! goes through [`Retry`]. Attempt counts are totals: a policy with
//! `attempts = 3` calls the operation at most three times.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// How the delay grows between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed,
    /// Delay multiplied by `factor` after each failure, capped at `max`.
    Exponential { factor: u32, max: Duration },
}

/// Attempt limit and delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
        }
    }

    /// Doubling delay, capped at `max`.
    pub fn exponential(attempts: u32, delay: Duration, max: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            backoff: Backoff::Exponential { factor: 2, max },
        }
    }

    /// A single attempt, no waiting.
    pub fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { factor, max } => {
                let exp = attempt.saturating_sub(1).min(16);
                let multiplier = factor.saturating_pow(exp);
                self.delay.saturating_mul(multiplier).min(max)
            }
        }
    }
}

/// The last error after retries were exhausted or a non-retryable error.
#[derive(Debug)]
pub struct RetryError<E> {
    /// Number of attempts that were made.
    pub attempts: u32,
    pub error: E,
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        self.error
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} attempt(s))", self.error, self.attempts)
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Runs an async operation under a [`RetryPolicy`].
///
/// ```rust
/// use std::time::Duration;
/// use clusterwatch::retry::{Retry, RetryPolicy};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let result: Result<u32, _> = Retry::new(RetryPolicy::fixed(3, Duration::ZERO), "answer")
///     .run(|| async { Ok::<_, std::io::Error>(42) })
///     .await;
/// assert_eq!(result.unwrap(), 42);
/// # }
/// ```
pub struct Retry<'a, E> {
    policy: RetryPolicy,
    label: &'a str,
    retryable: Box<dyn Fn(&E) -> bool + Send + Sync + 'a>,
}

impl<'a, E: fmt::Display> Retry<'a, E> {
    /// Retry every error under `policy`. `label` names the operation in logs.
    pub fn new(policy: RetryPolicy, label: &'a str) -> Self {
        Self {
            policy,
            label,
            retryable: Box::new(|_| true),
        }
    }

    /// Only retry errors matching `predicate`; others are returned at once.
    pub fn when(mut self, predicate: impl Fn(&E) -> bool + Send + Sync + 'a) -> Self {
        self.retryable = Box::new(predicate);
        self
    }

    pub async fn run<T, F, Fut>(self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(label = self.label, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !(self.retryable)(&error) {
                        warn!(label = self.label, attempt, "{} failed: {}", self.label, error);
                        return Err(RetryError {
                            attempts: attempt,
                            error,
                        });
                    }
                    if attempt >= self.policy.attempts {
                        warn!(
                            label = self.label,
                            attempt,
                            "{} failed, giving up: {}",
                            self.label,
                            error
                        );
                        return Err(RetryError {
                            attempts: attempt,
                            error,
                        });
                    }

                    let delay = self.policy.delay_after(attempt);
                    warn!(
                        label = self.label,
                        attempt,
                        max_attempts = self.policy.attempts,
                        delay_ms = delay.as_millis() as u64,
                        "{} failed, retrying: {}",
                        self.label,
                        error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    struct Flaky(&'static str);

    impl fmt::Display for Flaky {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    #[test]
    fn test_delay_schedule() {
        let fixed = RetryPolicy::fixed(5, Duration::from_secs(2));
        assert_eq!(fixed.delay_after(1), Duration::from_secs(2));
        assert_eq!(fixed.delay_after(4), Duration::from_secs(2));

        let exp = RetryPolicy::exponential(5, Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(exp.delay_after(1), Duration::from_secs(1));
        assert_eq!(exp.delay_after(2), Duration::from_secs(2));
        assert_eq!(exp.delay_after(3), Duration::from_secs(4));
        assert_eq!(exp.delay_after(4), Duration::from_secs(5));
        assert_eq!(exp.delay_after(40), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::fixed(0, Duration::ZERO).attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = Retry::new(RetryPolicy::fixed(5, Duration::from_secs(2)), "connect")
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(Flaky("refused"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let err = Retry::new(
            RetryPolicy::exponential(3, Duration::from_secs(1), Duration::from_secs(30)),
            "post",
        )
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Flaky("503")) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(err.error, Flaky("503"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s, no sleep after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_returns_immediately() {
        let calls = AtomicU32::new(0);

        let err = Retry::new(RetryPolicy::fixed(5, Duration::from_secs(1)), "auth")
            .when(|e: &Flaky| e.0 != "denied")
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(Flaky("denied")) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.to_string(), "denied (after 1 attempt(s))");
    }
}
