//! Animation-frame batching for layout reads and writes

use std::time::{Duration, Instant};

/// One frame at 60 FPS (16.67 ms).
pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Coalesces bursts of work requests onto frame boundaries.
///
/// Any number of [`request`](FrameBatcher::request) calls inside one frame
/// interval are released as a single batch by
/// [`poll`](FrameBatcher::poll), which keeps interleaved layout reads and
/// writes from thrashing.
#[derive(Debug, Clone)]
pub struct FrameBatcher {
    interval: Duration,
    release_at: Option<Instant>,
    batched: usize,
}

impl FrameBatcher {
    pub fn new(interval: Duration) -> Self {
        Self { interval, release_at: None, batched: 0 }
    }

    /// Queue one unit of work for the next frame boundary.
    pub fn request(&mut self, now: Instant) {
        if self.release_at.is_none() {
            self.release_at = Some(now + self.interval);
        }
        self.batched += 1;
    }

    /// Release the batch once the frame boundary has passed, returning how
    /// many requests it coalesced.
    pub fn poll(&mut self, now: Instant) -> Option<usize> {
        let release_at = self.release_at?;
        if now < release_at {
            return None;
        }
        self.release_at = None;
        Some(std::mem::take(&mut self.batched))
    }

    /// Drop the pending batch without releasing it.
    pub fn cancel(&mut self) {
        self.release_at = None;
        self.batched = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.release_at.is_some()
    }
}

impl Default for FrameBatcher {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}
