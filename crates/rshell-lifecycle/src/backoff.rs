//! Exponential backoff for status polling

use std::time::Duration;

use rshell_core::config::WaitConfig;

/// Exponential backoff with jitter between status polls
pub struct ExponentialBackoff {
    /// Current delay
    current: Duration,
    /// Maximum delay
    max: Duration,
    /// Multiplier
    multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    jitter: f64,
}

impl ExponentialBackoff {
    /// Create a new backoff from the wait configuration
    pub fn from_config(config: &WaitConfig) -> Self {
        Self::new(
            config.initial_delay,
            config.max_delay,
            config.multiplier,
            config.jitter,
        )
    }

    /// Create a new backoff with custom parameters
    pub fn new(initial: Duration, max: Duration, multiplier: f64, jitter: f64) -> Self {
        Self {
            current: std::cmp::min(initial, max),
            max,
            multiplier,
            jitter: jitter.clamp(0.0, 1.0),
        }
    }

    /// Get the next delay and advance the backoff.
    ///
    /// Jitter never pushes a delay past the ceiling.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;

        let next = Duration::from_secs_f64(self.current.as_secs_f64() * self.multiplier);
        self.current = std::cmp::min(next, self.max);

        let jitter_amount = delay.as_secs_f64() * self.jitter * rand::random::<f64>();
        std::cmp::min(delay + Duration::from_secs_f64(jitter_amount), self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_increases() {
        let mut backoff = ExponentialBackoff::new(
            Duration::from_secs(1),
            Duration::from_secs(60),
            2.0,
            0.0, // No jitter for deterministic test
        );

        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_max() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(15), 1.5, 0.0);

        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
        assert_eq!(backoff.next_delay(), Duration::from_secs(15)); // Capped at max
        assert_eq!(backoff.next_delay(), Duration::from_secs(15)); // Still capped
    }

    #[test]
    fn test_jitter_respects_ceiling() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(15), Duration::from_secs(15), 2.0, 1.0);
        for _ in 0..20 {
            assert!(backoff.next_delay() <= Duration::from_secs(15));
        }
    }

    #[test]
    fn test_from_default_config() {
        let mut backoff = ExponentialBackoff::from_config(&WaitConfig::default());
        assert_eq!(backoff.next_delay(), Duration::from_secs(6));
        assert_eq!(backoff.next_delay(), Duration::from_secs(9));
        assert_eq!(backoff.next_delay(), Duration::from_secs_f64(13.5));
        assert_eq!(backoff.next_delay(), Duration::from_secs(15));
    }
}
