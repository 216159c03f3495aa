//! Core rate limiter implementation.

use parking_lot::Mutex;
use std::time::Instant;
use tracing::trace;

use super::backend::AdmissionControl;
use super::window::SlidingWindow;

/// The process-wide rate limiter guarding one sliding window.
///
/// This struct is thread-safe and can be shared across multiple tasks.
/// Every decision, including the clock read, happens under a single lock
/// so admissions are recorded in one total order.
pub struct RateLimiter {
    /// Admission log guarded for the whole read-decide-write sequence
    window: Mutex<SlidingWindow>,
}

impl RateLimiter {
    /// Create a rate limiter admitting at most `capacity` requests per second.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Mutex::new(SlidingWindow::new(capacity)),
        }
    }

    /// Decide for a request that arrived at `now`.
    pub fn decide(&self, now: Instant) -> bool {
        self.window.lock().decide(now)
    }

    /// Decide for a request arriving right now.
    pub fn check(&self) -> bool {
        self.acquire().is_some()
    }

    /// Decide for a request arriving right now and return the recorded
    /// admission time, or `None` when the request is rejected.
    pub fn acquire(&self) -> Option<Instant> {
        let (now, admitted, held) = {
            let mut window = self.window.lock();
            let now = Instant::now();
            let admitted = window.decide(now);
            (now, admitted, window.len())
        };

        trace!(admitted, held, "Admission decision");

        admitted.then_some(now)
    }

    /// Maximum admissions per trailing second.
    pub fn capacity(&self) -> usize {
        self.window.lock().capacity()
    }

    /// Number of admission timestamps currently held.
    pub fn len(&self) -> usize {
        self.window.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.lock().is_empty()
    }
}

impl AdmissionControl for RateLimiter {
    fn admit(&self) -> bool {
        self.check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::window::WINDOW;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(10);
        assert_eq!(limiter.capacity(), 10);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_check_caps_burst() {
        let limiter = RateLimiter::new(5);

        for _ in 0..5 {
            assert!(limiter.check());
        }

        // The 6th request lands well inside the same second
        assert!(!limiter.check());
        assert_eq!(limiter.len(), 5);
    }

    #[test]
    fn test_decide_with_explicit_timestamps() {
        let limiter = RateLimiter::new(2);
        let base = Instant::now();

        assert!(limiter.decide(base));
        assert!(limiter.decide(base + Duration::from_millis(100)));
        assert!(!limiter.decide(base + Duration::from_millis(500)));
        assert!(limiter.decide(base + Duration::from_millis(1050)));
        assert!(!limiter.decide(base + Duration::from_millis(1090)));
    }

    #[test]
    fn test_history_stays_bounded() {
        let limiter = RateLimiter::new(4);
        let base = Instant::now();

        for i in 0..10_000u64 {
            limiter.decide(base + Duration::from_millis(i * 7));
            assert!(limiter.len() <= 4);
        }
    }

    #[test]
    fn test_concurrent_admissions_respect_window() {
        const CAPACITY: usize = 50;
        const THREADS: usize = 8;

        let limiter = Arc::new(RateLimiter::new(CAPACITY));
        let deadline = Instant::now() + Duration::from_millis(2500);

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    let mut admitted = Vec::new();
                    while Instant::now() < deadline {
                        if let Some(at) = limiter.acquire() {
                            admitted.push(at);
                        }
                    }
                    admitted
                })
            })
            .collect();

        let mut admitted: Vec<Instant> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        admitted.sort_unstable();

        // At least the warm-up burst plus one refill got through.
        assert!(admitted.len() >= 2 * CAPACITY);
        assert!(limiter.len() <= CAPACITY);

        for span in admitted.windows(CAPACITY + 1) {
            assert!(span[CAPACITY].duration_since(span[0]) >= WINDOW);
        }
    }
}
