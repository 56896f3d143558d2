//! Monotonic microsecond time source.

use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Microseconds since the clock was created. Never goes backwards.
    fn now_us(&self) -> u64;
}

/// `Instant`-backed clock starting at 0 on construction ("boot").
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        duration_us(self.start.elapsed())
    }
}

/// Whole microseconds in `d`, saturating at `u64::MAX`.
fn duration_us(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
