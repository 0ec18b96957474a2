//! Trailing-edge debounce

use std::time::{Duration, Instant};

/// Default quiet period for resize and mutation debouncing.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Trailing-edge timer: fires once a quiet period has passed since the most
/// recent trigger. A new trigger supersedes the pending deadline.
#[derive(Debug, Clone)]
pub struct Debounce {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(quiet_period: Duration) -> Self {
        Self { quiet_period, deadline: None }
    }

    /// Start or restart the quiet period.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// Fire once the quiet period has elapsed since the last trigger.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending deadline without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_after_the_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(100));

        debounce.trigger(start);
        assert!(!debounce.poll(start + Duration::from_millis(50)));
        assert!(debounce.poll(start + Duration::from_millis(100)));
        assert!(!debounce.poll(start + Duration::from_millis(200)));
    }

    #[test]
    fn retrigger_supersedes_the_pending_deadline() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(100));

        debounce.trigger(start);
        debounce.trigger(start + Duration::from_millis(80));

        assert!(!debounce.poll(start + Duration::from_millis(120)));
        assert!(debounce.poll(start + Duration::from_millis(180)));
    }

    #[test]
    fn cancel_discards_the_pending_fire() {
        let start = Instant::now();
        let mut debounce = Debounce::default();

        debounce.trigger(start);
        assert!(debounce.is_pending());
        debounce.cancel();
        assert!(!debounce.is_pending());
        assert!(!debounce.poll(start + Duration::from_secs(1)));
    }
}
