//! Retry with exponential backoff on provider rate limits

use std::time::Duration;

use super::LlmError;

/// How rate-limited requests are retried
///
/// Delays start at `initial_backoff` and double per retry, capped at
/// `max_backoff`. A `Retry-After` hint from the provider replaces the
/// computed delay (still capped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (zero-based)
    pub fn delay_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let delay = match hint {
            Some(hint) => hint,
            None => self
                .initial_backoff
                .saturating_mul(2u32.saturating_pow(retry)),
        };
        delay.min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. `op` receives the one-based attempt number.
    pub fn run<T>(&self, mut op: impl FnMut(u32) -> Result<T, LlmError>) -> Result<T, LlmError> {
        let mut retry = 0;
        loop {
            match op(retry + 1) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    let delay = self.delay_for(retry, err.retry_after());
                    tracing::warn!(
                        attempt = retry + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Rate limited by model provider, backing off"
                    );
                    std::thread::sleep(delay);
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(0, None), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1, None), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2, None), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3, None), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40, None), Duration::from_secs(5));
    }

    #[test]
    fn test_hint_overrides_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(7))),
            Duration::from_secs(7)
        );
        assert_eq!(
            policy.delay_for(0, Some(Duration::from_secs(600))),
            policy.max_backoff
        );
    }

    #[test]
    fn test_retries_rate_limits_then_succeeds() {
        let mut attempts = Vec::new();
        let result = instant_policy(3).run(|attempt| {
            attempts.push(attempt);
            if attempt < 3 {
                Err(LlmError::RateLimited { retry_after: None })
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts, vec![1, 2, 3]);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let mut calls = 0;
        let result: Result<(), _> = instant_policy(2).run(|_| {
            calls += 1;
            Err(LlmError::RateLimited { retry_after: None })
        });
        assert!(matches!(result, Err(LlmError::RateLimited { .. })));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_non_retryable_fails_fast() {
        let mut calls = 0;
        let result: Result<(), _> = instant_policy(5).run(|_| {
            calls += 1;
            Err(LlmError::Status {
                status: 500,
                body: String::new(),
            })
        });
        assert!(matches!(result, Err(LlmError::Status { status: 500, .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_none_policy_never_retries() {
        let mut calls = 0;
        let _ = RetryPolicy::none().run(|_| -> Result<(), LlmError> {
            calls += 1;
            Err(LlmError::RateLimited { retry_after: None })
        });
        assert_eq!(calls, 1);
    }
}
