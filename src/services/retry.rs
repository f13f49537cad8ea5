use std::time::Duration;
use tokio::time::sleep;

use crate::config::GenerationConfig;

/// Bounded attempts with linear backoff between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base_ms: config.retry_backoff_ms,
        }
    }

    pub fn attempts(&self) -> impl Iterator<Item = u32> {
        1..=self.max_attempts
    }

    pub fn is_last(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Delay after a failed attempt: `attempt * base`
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_base_ms.saturating_mul(u64::from(attempt)))
    }

    /// Sleeps before the next attempt. Not cancellable once started.
    pub async fn wait_after(&self, attempt: u32) {
        let delay = self.delay_after(attempt);
        tracing::debug!("Attempt {} failed, retrying in {}ms", attempt, delay.as_millis());
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_attempt_bounds() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..Default::default()
        };
        assert_eq!(policy.attempts().collect::<Vec<_>>(), vec![1, 2]);
        assert!(!policy.is_last(1));
        assert!(policy.is_last(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_for_delay() {
        let policy = RetryPolicy::default();
        let start = Instant::now();
        policy.wait_after(2).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2000));
        assert!(elapsed < Duration::from_millis(2100));
    }
}
