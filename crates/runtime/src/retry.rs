//! Bounded exponential retry.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff.
///
/// Attempt `n` (zero-based) is followed by a delay of
/// `base_delay * multiplier^n`. There is no delay after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    /// 10 attempts, 500ms doubling.
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts,
            base_delay,
            multiplier,
        }
    }

    /// Delay after the zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it yields `Some`, at most `max_attempts` times.
    ///
    /// Errors count as misses and are logged. Returns `None` once attempts
    /// are exhausted so the caller can take its fallback path.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Option<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
        E: Display,
    {
        for attempt in 0..self.max_attempts {
            match op(attempt).await {
                Ok(Some(value)) => return Some(value),
                Ok(None) => tracing::debug!(attempt, "Retry attempt found nothing"),
                Err(e) => tracing::warn!(attempt, "Retry attempt failed: {}", e),
            }
            if attempt + 1 < self.max_attempts {
                tokio::time::sleep(self.delay_for(attempt)).await;
            }
        }
        tracing::debug!(attempts = self.max_attempts, "Retry attempts exhausted");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[test]
    fn delays_double_from_500ms() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (0..4).map(|a| policy.delay_for(a).as_millis() as u64).collect();
        assert_eq!(delays, vec![500, 1_000, 2_000, 4_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts_with_increasing_gaps() {
        let policy = RetryPolicy::default();
        let started = Instant::now();
        let seen = Mutex::new(Vec::new());

        let result: Option<()> = policy
            .run(|_| {
                seen.lock().unwrap().push(started.elapsed());
                async { Ok::<_, String>(None) }
            })
            .await;

        assert_eq!(result, None);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 10);

        let gaps: Vec<Duration> = seen.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.windows(2).all(|g| g[1] > g[0]));
        assert_eq!(gaps[0], Duration::from_millis(500));

        // 500 * (2^9 - 1) ms in total, no sleep after the last attempt.
        assert_eq!(started.elapsed(), Duration::from_millis(500 * 511));
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_hit() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let result = policy
            .run(|attempt| {
                calls += 1;
                async move {
                    if attempt == 2 {
                        Ok::<_, String>(Some(attempt))
                    } else {
                        Err("not yet".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result, Some(2));
        assert_eq!(calls, 3);
    }
}
