//! Sliding-window admission log backed by a fixed-size ring buffer.
//!
//! The window only needs to remember the last `capacity` admission times:
//! if the oldest of them is less than one second old, the trailing second
//! already holds `capacity` admissions and the next request must be turned
//! away. Memory stays at exactly `capacity` timestamps and every decision
//! is O(1).

use std::time::{Duration, Instant};

/// Length of the trailing window.
pub const WINDOW: Duration = Duration::from_secs(1);

/// Ring buffer of the most recent admission timestamps.
///
/// This type is not synchronized; see [`RateLimiter`](super::RateLimiter)
/// for the shared, lock-guarded wrapper.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    /// Maximum admissions per trailing window
    capacity: usize,
    /// Admission timestamps, never longer than `capacity`
    history: Vec<Instant>,
    /// Next slot to overwrite once `history` is full
    cursor: usize,
}

impl SlidingWindow {
    /// Create an empty window admitting at most `capacity` requests per second.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            history: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Decide whether a request arriving at `now` is admitted.
    ///
    /// Admission records `now`; rejection leaves the window untouched.
    pub fn decide(&mut self, now: Instant) -> bool {
        if self.history.len() < self.capacity {
            self.history.push(now);
            self.cursor = self.history.len() % self.capacity;
            return true;
        }

        // Zero capacity has no slot to compare against.
        let Some(&oldest) = self.history.get(self.cursor) else {
            return false;
        };

        // A clock that went backwards saturates to zero and stays inside the window.
        if now.saturating_duration_since(oldest) < WINDOW {
            return false;
        }

        self.history[self.cursor] = now;
        self.cursor = (self.cursor + 1) % self.capacity;
        true
    }

    /// Maximum admissions per trailing window.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of timestamps currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Whether warm-up is over and every admission now overwrites a slot.
    pub fn is_saturated(&self) -> bool {
        self.history.len() == self.capacity
    }

    /// The oldest recorded admission, i.e. the next one to be overwritten.
    pub fn oldest(&self) -> Option<Instant> {
        if self.is_saturated() {
            self.history.get(self.cursor).copied()
        } else {
            self.history.first().copied()
        }
    }
}
