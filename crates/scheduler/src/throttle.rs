//! Fixed-interval throttle with leading-edge fire and trailing catch-up

use std::time::{Duration, Instant};

/// Default scroll throttle interval, roughly 60 updates per second.
pub const SCROLL_THROTTLE_INTERVAL: Duration = Duration::from_micros(16_667);

/// Fixed-interval rate limiter.
///
/// The first trigger in an interval fires immediately (leading edge).
/// Triggers suppressed inside the interval leave a trailing request behind,
/// released by [`poll`](Throttle::poll) once the interval has elapsed, so a
/// burst always ends with one final up-to-date pass.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fire: Option<Instant>,
    trailing_pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_fire: None, trailing_pending: false }
    }

    /// Throttle tuned for scroll events (~60 Hz).
    pub fn for_scroll() -> Self {
        Self::new(SCROLL_THROTTLE_INTERVAL)
    }

    /// Register a trigger. Returns `true` when the trigger fires now,
    /// `false` when it was folded into a trailing catch-up.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.last_fire {
            Some(last) if now.duration_since(last) < self.interval => {
                self.trailing_pending = true;
                false
            }
            _ => {
                self.last_fire = Some(now);
                self.trailing_pending = false;
                true
            }
        }
    }

    /// Release a pending trailing fire once the interval has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.trailing_pending {
            return false;
        }
        match self.last_fire {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_fire = Some(now);
                self.trailing_pending = false;
                true
            }
        }
    }

    /// Drop any pending trailing fire and forget the last fire time.
    pub fn reset(&mut self) {
        self.last_fire = None;
        self.trailing_pending = false;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_trigger_fires_on_the_leading_edge() {
        let mut throttle = Throttle::new(Duration::from_millis(16));
        assert!(throttle.fire(Instant::now()));
    }

    #[test]
    fn triggers_inside_the_interval_are_suppressed() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(16));

        assert!(throttle.fire(start));
        assert!(!throttle.fire(start + Duration::from_millis(5)));
        assert!(!throttle.fire(start + Duration::from_millis(10)));
        assert!(throttle.fire(start + Duration::from_millis(20)));
    }

    #[test]
    fn suppressed_burst_leaves_a_trailing_fire() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(16));

        assert!(throttle.fire(start));
        assert!(!throttle.fire(start + Duration::from_millis(8)));

        assert!(!throttle.poll(start + Duration::from_millis(12)));
        assert!(throttle.poll(start + Duration::from_millis(16)));
        // Catch-up fired; nothing further is pending.
        assert!(!throttle.poll(start + Duration::from_millis(40)));
    }

    #[test]
    fn reset_clears_pending_state() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(16));

        throttle.fire(start);
        throttle.fire(start + Duration::from_millis(1));
        throttle.reset();

        assert!(!throttle.poll(start + Duration::from_millis(100)));
        assert!(throttle.fire(start + Duration::from_millis(101)));
    }
}
