use std::time::{Duration, Instant};

/// Fibonacci backoff settings for state-version polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Unit the Fibonacci sequence is multiplied by
    pub base: Duration,
    /// Longest single wait
    pub cap: Duration,
    /// Total time budget, measured from the start of the retry loop
    pub max_elapsed: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(7),
            max_elapsed: Duration::from_secs(5 * 60),
        }
    }
}

/// Wait-interval generator: `base * fib(n)` capped per step, bounded overall.
///
/// Yields 2s, 4s, 6s, 7s, 7s... with the default config. Once the budget is
/// spent it yields nothing; the last wait is cut to what remains.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    config: BackoffConfig,
    started: Instant,
    previous: Duration,
    current: Duration,
}

impl FibonacciBackoff {
    pub fn new(config: BackoffConfig, started: Instant) -> Self {
        Self {
            config,
            started,
            previous: Duration::ZERO,
            current: config.base,
        }
    }

    /// Next wait, or `None` when the overall budget is exhausted
    pub fn next_interval(&mut self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.started);
        let remaining = self.config.max_elapsed.checked_sub(elapsed)?;
        if remaining.is_zero() {
            return None;
        }

        // base * fib(n), with fib running 1, 2, 3, 5...; frozen once past the cap
        if self.current < self.config.cap {
            let next = self.previous.saturating_add(self.current);
            self.previous = self.current;
            self.current = next;
        }

        Some(self.current.min(self.config.cap).min(remaining))
    }
}
