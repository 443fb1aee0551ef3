//! Fixed-count retry for Veo requests.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::VeoResult;

/// Retry settings: a fixed number of extra attempts with a constant delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> VeoResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = VeoResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        operation = %operation,
                        attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Veo request failed, retrying"
                    );
                    tokio::time::sleep(self.delay).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VeoError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_stops_after_fixed_count() {
        let policy = RetryPolicy {
            max_retries: 2,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: VeoResult<()> = policy
            .run("submit", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VeoError::Http {
                    status: 503,
                    message: "unavailable".into(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rate_limited_fails_after_one_call() {
        let policy = RetryPolicy {
            max_retries: 3,
            delay: Duration::from_millis(1),
        };
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: VeoResult<()> = policy
            .run("submit", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VeoError::Http {
                    status: 429,
                    message: "Resource has been exhausted".into(),
                })
            })
            .await;
        assert_eq!(result.unwrap_err().http_status(), Some(429));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: VeoResult<()> = policy
            .run("submit", || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(VeoError::Http {
                    status: 400,
                    message: "bad request".into(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
