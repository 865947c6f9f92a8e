//! Minimum-interval rate limiter for a single RPC class
//!
//! Each request class (scalar, tensor, blob, logdir poll) owns its own
//! limiter; there is no global limiter. Comparison uses the monotonic
//! clock so wall-clock jumps cannot shorten or extend the interval.

use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between successive calls
///
/// Not thread-safe by design: the pipeline is a single cooperative task
/// and callers hold the limiter mutably.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    /// Wait until at least the configured interval has passed since the
    /// previous tick. The first call never blocks.
    pub async fn tick(&mut self) {
        if let Some(last) = self.last_tick {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last_tick = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_is_free() {
        let mut limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        limiter.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_tick_waits_out_the_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(10));
        limiter.tick().await;

        let start = Instant::now();
        limiter.tick().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_time_counts_toward_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(10));
        limiter.tick().await;

        tokio::time::sleep(Duration::from_secs(7)).await;

        let start = Instant::now();
        limiter.tick().await;
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(3));
        assert!(waited < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_caller_never_blocks() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.tick().await;

        tokio::time::sleep(Duration::from_secs(5)).await;

        let start = Instant::now();
        limiter.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
