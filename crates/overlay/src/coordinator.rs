//! Overlay exclusivity coordinator
//!
//! At most one form or modal is active at a time, always sitting on top of a
//! full-viewport input-blocking backdrop. Opening a new surface closes the
//! previous one first; Escape and outside clicks close the active one. The
//! outside-click listener arms only after a short defer so the click that
//! opened the surface is not immediately caught.

use std::time::{Duration, Instant};

use overmark_dom::{DocumentView, NodeId};
use tracing::debug;

/// Defer before outside clicks start closing a freshly opened surface.
pub const OUTSIDE_CLICK_ARM_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Form,
    Modal,
}

/// A floating UI unit governed by the exclusivity rule.
///
/// Implementations own their visuals and tear them down on drop; the
/// coordinator only needs the subtree root for outside-click containment.
pub trait Surface {
    fn kind(&self) -> SurfaceKind;

    /// Root element of the surface's DOM subtree.
    fn root(&self) -> NodeId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeOutcome {
    /// An active surface consumed the keypress.
    SurfaceClosed,
    /// Nothing was active; the caller may exit comment mode instead.
    Propagate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No surface is active; the click is the page's to handle.
    NoActiveSurface,
    /// The click landed before the outside-click listener armed.
    NotYetArmed,
    /// The click landed inside the active surface.
    Inside,
    /// The click landed outside and closed the surface.
    ClosedSurface,
}

struct ActiveSurface {
    surface: Box<dyn Surface>,
    armed_at: Instant,
}

/// Enforces the one-active-surface invariant and owns the blocking backdrop.
pub struct OverlayCoordinator {
    active: Option<ActiveSurface>,
    arm_delay: Duration,
}

impl OverlayCoordinator {
    pub fn new() -> Self {
        Self { active: None, arm_delay: OUTSIDE_CLICK_ARM_DELAY }
    }

    pub fn with_arm_delay(mut self, arm_delay: Duration) -> Self {
        self.arm_delay = arm_delay;
        self
    }

    /// Activate `surface`, closing whatever was active first.
    pub fn open(&mut self, surface: Box<dyn Surface>, now: Instant) {
        self.close_active();
        debug!(kind = ?surface.kind(), "opening overlay surface");
        self.active = Some(ActiveSurface { surface, armed_at: now + self.arm_delay });
    }

    /// Destroy the active surface and its backdrop. No-op when idle.
    pub fn close_active(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                debug!(kind = ?active.surface.kind(), "closing overlay surface");
                drop(active);
                true
            }
            None => false,
        }
    }

    pub fn has_active_surface(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_kind(&self) -> Option<SurfaceKind> {
        self.active.as_ref().map(|active| active.surface.kind())
    }

    /// The input-blocking backdrop exists exactly while a surface is active.
    pub fn is_backdrop_active(&self) -> bool {
        self.active.is_some()
    }

    /// Escape closes the active surface before anything else gets the key.
    pub fn handle_escape(&mut self) -> EscapeOutcome {
        if self.close_active() {
            EscapeOutcome::SurfaceClosed
        } else {
            EscapeOutcome::Propagate
        }
    }

    /// Route a click: anything outside the active surface's subtree closes
    /// it, once the listener has armed.
    pub fn handle_click(
        &mut self,
        doc: &dyn DocumentView,
        target: NodeId,
        now: Instant,
    ) -> ClickOutcome {
        let Some(active) = &self.active else {
            return ClickOutcome::NoActiveSurface;
        };
        if now < active.armed_at {
            return ClickOutcome::NotYetArmed;
        }
        if doc.contains(active.surface.root(), target) {
            return ClickOutcome::Inside;
        }

        self.close_active();
        ClickOutcome::ClosedSurface
    }
}

impl Default for OverlayCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
