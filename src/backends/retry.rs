// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::errors::{BackendError, BackendResult};
use crate::observability::messages::{backend::RetryScheduled, StructuredLog};

/// Which failures earn another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    /// Network failures, 5xx-class responses and timeouts.
    Transient,
    /// Transient failures plus unusable payloads. Used for the script
    /// writer, whose output is rejected and regenerated rather than trusted.
    TransientOrInvalid,
}

impl RetryOn {
    fn allows(&self, error: &BackendError) -> bool {
        match self {
            RetryOn::Transient => error.is_transient(),
            RetryOn::TransientOrInvalid => {
                error.is_transient() || matches!(error, BackendError::InvalidResponse(_))
            }
        }
    }
}

/// Bounded retry with exponential backoff and a per-attempt timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig, call_timeout: Duration) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
            call_timeout,
        }
    }

    /// Delay before attempt `attempt + 1`: base, 2x base, 4x base, capped.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `call` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, retry_on: RetryOn, mut call: F) -> BackendResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.call_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout(self.call_timeout)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts && retry_on.allows(&error) => {
                    let delay = self.delay_after(attempt);
                    RetryScheduled {
                        operation,
                        attempt,
                        max_attempts: self.max_attempts,
                        delay,
                        error: &error,
                    }
                    .log();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            call_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
            call_timeout: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(300));
        assert_eq!(policy.delay_after(30), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast_policy(3)
            .run("image", RetryOn::Transient, || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::Transient("503".into()))
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: BackendResult<()> = fast_policy(2)
            .run("voice", RetryOn::Transient, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Transient("connection reset".into()))
            })
            .await;

        assert!(matches!(result, Err(BackendError::Transient(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: BackendResult<()> = fast_policy(5)
            .run("image", RetryOn::Transient, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::QuotaExceeded("out of credits".into()))
            })
            .await;

        assert!(matches!(result, Err(BackendError::QuotaExceeded(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_payloads_retry_only_when_asked() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _: BackendResult<()> = fast_policy(3)
            .run("image", RetryOn::Transient, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::InvalidResponse("not json".into()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        calls.store(0, Ordering::SeqCst);
        let _: BackendResult<()> = fast_policy(3)
            .run("script", RetryOn::TransientOrInvalid, || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::InvalidResponse("not json".into()))
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_slow_calls_time_out() {
        let policy = RetryPolicy {
            call_timeout: Duration::from_millis(10),
            ..fast_policy(1)
        };
        let result: BackendResult<()> = policy
            .run("motion", RetryOn::Transient, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(BackendError::Timeout(_))));
    }
}
