//! Bounded automatic reconnection.
//!
//! # Responsibilities
//! - Hold the per-adapter reconnect budget
//! - Compute the delay before each attempt
//! - Decide when a reconnection counts as confirmed
//!
//! # Design Decisions
//! - The counter only resets on a confirmed success: a caller-initiated
//!   enable, or a reconnected session that stayed up for the stability window
//! - Once the budget is spent the adapter stops retrying until a caller
//!   enables it again

use std::time::Duration;

use crate::resilience::backoff::calculate_backoff;

/// Default number of automatic reconnection attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Reconnection tuning for one adapter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// How long a reconnected session must survive before the counter resets.
    pub stability_window: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay: Duration::ZERO,
            max_delay: Duration::from_millis(2_000),
            stability_window: Duration::from_millis(5_000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay to wait before reconnection attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.base_delay.as_millis() as u64,
            self.max_delay.as_millis() as u64,
        )
    }
}

/// Reconnection attempts made since the last confirmed success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectCounter {
    attempts: u32,
    max: u32,
}

impl ReconnectCounter {
    pub fn new(max: u32) -> Self {
        Self { attempts: 0, max }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max
    }

    /// Count one more attempt. Returns the attempt number, or `None` when
    /// the budget is already spent.
    pub fn try_increment(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.attempts)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
