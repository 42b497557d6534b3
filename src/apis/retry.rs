/// Exponential backoff around fallible async operations
///
/// The policy is generic over any error implementing [`Retryable`]; provider
/// clients use it with [`crate::errors::ApiError`].
use crate::config::RetryConfig;
use crate::errors::Retryable;
use crate::logger::{self, LogTag};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of the random jitter as a fraction of the delay
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            jitter_ratio: config.jitter_ratio.clamp(0.0, 1.0),
        }
    }

    /// Delay before the attempt following `attempt` (zero-based), without jitter
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let delay = self.backoff_delay(attempt);
        if self.jitter_ratio <= 0.0 {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(0.0..=self.jitter_ratio);
        delay + delay.mul_f64(jitter)
    }
}

/// Run `operation` until it succeeds, fails non-retryably, or attempts run out
///
/// `label` only appears in log lines.
pub async fn execute<T, E, F, Fut>(label: &str, policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() {
                    logger::debug(
                        LogTag::Api,
                        &format!("{}: non-retryable error, giving up: {}", label, err),
                    );
                    return Err(err);
                }

                if attempt + 1 >= max_attempts {
                    logger::debug(
                        LogTag::Api,
                        &format!("{}: retries exhausted after {} attempts: {}", label, max_attempts, err),
                    );
                    return Err(err);
                }

                let delay = policy.delay_with_jitter(attempt);
                logger::warning(
                    LogTag::Api,
                    &format!(
                        "{}: retry attempt {}/{} after {}ms ({})",
                        label,
                        attempt + 1,
                        max_attempts,
                        delay.as_millis(),
                        err
                    ),
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
