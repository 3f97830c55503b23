use std::{future::Future, time::Duration};

use sheets::SheetsError;

/// Exponential backoff for transient remote failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. `0` behaves like `1`.
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Never retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (0-based): `base_delay * 2^attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Runs `op` until it succeeds, fails permanently or runs out of
    /// attempts. Only [`SheetsError::is_transient`] failures are retried.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, SheetsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SheetsError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(err) if err.is_transient() && attempt + 1 < self.max_attempts => {
                    let delay = self.delay(attempt);
                    tracing::warn!(
                        "attempt {} failed: {err}, retrying in {}ms",
                        attempt + 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn delay_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn stops_on_permanent_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result: Result<(), _> = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SheetsError::Config("nope".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let result = policy
            .run(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SheetsError>(7)
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
