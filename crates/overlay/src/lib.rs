//! Interaction mode and overlay exclusivity
//!
//! Two small state machines that gate the whole annotation engine: the
//! [`ModeController`] toggles between passive browsing and annotation
//! authoring, and the [`OverlayCoordinator`] enforces that at most one
//! floating surface (form or modal) is ever active.

mod coordinator;
mod mode;

pub use coordinator::{
    ClickOutcome, EscapeOutcome, OverlayCoordinator, Surface, SurfaceKind, OUTSIDE_CLICK_ARM_DELAY,
};
pub use mode::{Mode, ModeChange, ModeController, SETTLE_REFRESH_DELAY};
