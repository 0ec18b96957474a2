//! Scheduling utilities for position recomputation
//!
//! Marker positions are recomputed in response to high-frequency page events,
//! so every trigger path is rate-limited: scroll through a leading-edge
//! [`Throttle`] with trailing catch-up, resize and mutation through a
//! trailing-edge [`Debounce`], and coalesced layout work through a
//! [`FrameBatcher`]. A bounded [`LruCache`] backs the advisory position
//! cache.
//!
//! All timers are driven by explicit `Instant`-valued `now` parameters rather
//! than reading the clock internally, so the embedding event loop owns time
//! and tests are deterministic.

mod debounce;
mod frame;
mod lru;
mod throttle;

pub use debounce::{Debounce, DEFAULT_QUIET_PERIOD};
pub use frame::{FrameBatcher, FRAME_INTERVAL};
pub use lru::LruCache;
pub use throttle::{Throttle, SCROLL_THROTTLE_INTERVAL};
