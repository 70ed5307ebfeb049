// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Bounded Retry with Backoff
 * Fixed or escalating delays, always capped by an attempt budget
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use crate::errors::{ReconError, ReconResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt budget and delay schedule. `max_attempts` counts every call, the first included.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,

    /// Delay after the first failed call
    pub initial_backoff: Duration,

    /// Upper bound for escalated delays
    pub max_backoff: Duration,

    /// 1.0 keeps the delay fixed, 2.0 doubles it per retry
    pub backoff_multiplier: f64,

    /// Extra random share of the delay (0.0 disables)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(3, Duration::from_millis(500))
    }
}

impl RetryConfig {
    /// Same delay before every retry
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff: delay,
            max_backoff: delay.max(Duration::from_secs(120)),
            backoff_multiplier: 1.0,
            jitter: 0.0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    /// Delay to wait after the `attempt`-th failed call (1-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let Some(retries) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };

        let escalated = self
            .initial_backoff
            .mul_f64(self.backoff_multiplier.max(1.0).powi(retries as i32))
            .min(self.max_backoff);

        // Jitter only ever lengthens the delay so the configured minimum holds
        if self.jitter > 0.0 {
            let extra = rand::rng().random_range(0.0..=self.jitter);
            escalated + escalated.mul_f64(extra)
        } else {
            escalated
        }
    }
}

/// Re-run `operation` while it fails with a retryable error, at most `max_attempts` times
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> ReconResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ReconResult<T>>,
{
    if config.max_attempts == 0 {
        return Err(ReconError::Configuration(format!(
            "'{}' configured with zero attempts",
            operation_name
        )));
    }

    let mut attempt = 1;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt = attempt, "Recovered after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let retryable = err.is_retryable();
        warn!(
            operation = operation_name,
            attempt = attempt,
            max_attempts = config.max_attempts,
            retryable = retryable,
            error = %err,
            "Attempt failed"
        );

        if !retryable || attempt >= config.max_attempts {
            return Err(err);
        }

        tokio::time::sleep(config.calculate_backoff(attempt)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NetworkError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn timeout_error() -> ReconError {
        ReconError::Network(NetworkError::ConnectionTimeout {
            url: "https://cve.mitre.org/cgi-bin/cvekey.cgi".to_string(),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn test_fixed_backoff() {
        let config = RetryConfig::fixed(3, Duration::from_secs(5));
        assert_eq!(config.calculate_backoff(0), Duration::ZERO);
        assert_eq!(config.calculate_backoff(1), Duration::from_secs(5));
        assert_eq!(config.calculate_backoff(2), Duration::from_secs(5));
    }

    #[test]
    fn test_escalating_backoff_is_capped() {
        let config = RetryConfig::fixed(10, Duration::from_secs(1))
            .with_multiplier(2.0)
            .with_max_backoff(Duration::from_secs(5));

        let delays: Vec<u64> = (1..=4).map(|a| config.calculate_backoff(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_jitter_never_shortens_delay() {
        let config = RetryConfig::fixed(3, Duration::from_millis(200)).with_jitter(0.5);
        for _ in 0..50 {
            let delay = config.calculate_backoff(1);
            assert!(delay >= Duration::from_millis(200));
            assert!(delay <= Duration::from_millis(300));
        }
    }

    #[tokio::test]
    async fn test_retryable_failures_use_the_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::fixed(3, Duration::from_millis(10));

        let result: ReconResult<&str> = retry_with_backoff(&config, "keyword_search", || {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(timeout_error())
                } else {
                    Ok("table")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "table");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::fixed(2, Duration::from_millis(5));

        let result: ReconResult<()> = retry_with_backoff(&config, "keyword_search", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(timeout_error())
            }
        })
        .await;

        assert!(matches!(result, Err(ReconError::Network(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = RetryConfig::fixed(5, Duration::from_millis(10));

        let result: ReconResult<()> = retry_with_backoff(&config, "rate_limit_check", || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ReconError::AuthFailure {
                    source_name: "github".to_string(),
                    reason: "bad token".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_attempts_is_configuration_error() {
        let config = RetryConfig::fixed(0, Duration::from_millis(1));
        let result: ReconResult<()> = retry_with_backoff(&config, "noop", || async { Ok(()) }).await;
        assert!(matches!(result, Err(ReconError::Configuration(_))));
    }
}
