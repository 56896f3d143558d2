//! Crank interval tracking.
//!
//! Each falling edge of the step sensor is one crank revolution. The tracker
//! keeps the last few edge timestamps and, once per second, turns them into
//! an averaged revolution period. A gap longer than `MAX_GAP_US` since the
//! last edge means the rider stopped pedaling and the window is dropped.

use log::debug;

/// How often the interval is recomputed.
pub const UPDATE_PERIOD_US: u64 = 1_000_000;

/// Longest plausible time between two edges at minimum cadence.
pub const MAX_GAP_US: u64 = 2_500_000;

/// Number of edge timestamps kept for averaging.
pub const WINDOW_SIZE: usize = 3;

/// Fixed-capacity FIFO of edge timestamps, oldest at `head`.
#[derive(Debug, Clone, Default)]
struct PulseWindow {
    slots: [u64; WINDOW_SIZE],
    head: usize,
    len: usize,
}

impl PulseWindow {
    fn push(&mut self, ts: u64) {
        let tail = (self.head + self.len) % WINDOW_SIZE;
        self.slots[tail] = ts;
        if self.len == WINDOW_SIZE {
            self.head = (self.head + 1) % WINDOW_SIZE;
        } else {
            self.len += 1;
        }
    }

    fn front(&self) -> Option<u64> {
        (self.len > 0).then(|| self.slots[self.head])
    }

    fn back(&self) -> Option<u64> {
        (self.len > 0).then(|| self.slots[(self.head + self.len - 1) % WINDOW_SIZE])
    }

    fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntervalTracker {
    window: PulseWindow,
    interval_us: u32,
    next_update_us: u64,
}

impl IntervalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a crank edge. Constant time and allocation-free so it can run
    /// straight from an edge interrupt.
    ///
    /// The first edge after a stop also pushes a synthetic edge `MAX_GAP_US`
    /// earlier, so a single revolution already yields a (slow) reading on
    /// the next recompute instead of waiting for a second edge. Near boot
    /// the seed wraps below zero; spans are taken with wrapping arithmetic
    /// so the first reading is still exactly `MAX_GAP_US`.
    pub fn on_pulse(&mut self, timestamp_us: u64) {
        if self.window.len == 0 {
            self.window.push(timestamp_us.wrapping_sub(MAX_GAP_US));
        }
        self.window.push(timestamp_us);
    }

    /// Recompute the interval if the update period has elapsed.
    ///
    /// Returns `Some(interval_us)` when a new value was produced (the
    /// metrics-update event) and `None` when called early. The very first
    /// call always runs.
    pub fn recompute(&mut self, now_us: u64) -> Option<u32> {
        if now_us < self.next_update_us {
            return None;
        }
        self.next_update_us = now_us + UPDATE_PERIOD_US;

        if let Some(last) = self.window.back() {
            if now_us.saturating_sub(last) >= MAX_GAP_US {
                debug!("No edge for {}us, crank stopped", now_us.saturating_sub(last));
                self.window.clear();
            }
        }

        self.interval_us = match (self.window.front(), self.window.back()) {
            (Some(oldest), Some(newest)) if self.window.len >= 2 => {
                let span = newest.wrapping_sub(oldest);
                let avg = span / (self.window.len as u64 - 1);
                u32::try_from(avg).unwrap_or(u32::MAX)
            }
            _ => 0,
        };

        debug!(
            "Interval recomputed: {}us over {} edges",
            self.interval_us, self.window.len
        );
        Some(self.interval_us)
    }

    /// Most recently computed interval, 0 when stopped.
    pub fn interval_us(&self) -> u32 {
        self.interval_us
    }

    /// Number of timestamps currently held (synthetic seed included).
    pub fn window_len(&self) -> usize {
        self.window.len
    }
}
