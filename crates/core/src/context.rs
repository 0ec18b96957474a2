//! Shared interaction context
//!
//! Explicit replacement for ambient process-wide flags: components receive
//! the same `Rc<SharedContext>` at construction, and ownership of each flag
//! is clear. Currently carries the click-suppression flag used during
//! cross-component navigation (e.g. jumping to a comment from a sidebar
//! should not also open a creation form).

use std::cell::Cell;

/// Flags shared across the widget's components. Single-threaded by design;
/// the whole engine runs on the page's main thread.
#[derive(Debug, Default)]
pub struct SharedContext {
    suppress_next_click: Cell<bool>,
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm suppression: the next click dispatched through the manager is
    /// swallowed.
    pub fn suppress_next_click(&self) {
        self.suppress_next_click.set(true);
    }

    /// Consume the flag. Returns `true` at most once per arming.
    pub fn take_click_suppression(&self) -> bool {
        self.suppress_next_click.replace(false)
    }

    pub fn is_click_suppressed(&self) -> bool {
        self.suppress_next_click.get()
    }
}
