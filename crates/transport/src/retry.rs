//! Retry policy

use std::time::Duration;

use contracts::TransportConfig;

/// Statuses worth another attempt
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// Exponential backoff, doubling up to a cap
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial, max }
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::new(config.initial_backoff(), config.max_backoff())
    }

    /// Delay to wait now; the following one is doubled
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next.min(self.max);
        self.next = (self.next * 2).min(self.max);
        delay
    }
}
