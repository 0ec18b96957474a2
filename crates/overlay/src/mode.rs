//! Two-state interaction mode machine

use std::time::{Duration, Instant};

/// Delay before the second forced refresh after entering comment mode,
/// absorbing late layout settling such as font loading.
pub const SETTLE_REFRESH_DELAY: Duration = Duration::from_millis(500);

/// Process-wide interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Passive browsing: layers hidden, marker positions frozen.
    #[default]
    Normal,
    /// Annotation authoring/viewing: layers visible, clicks intercepted,
    /// positions kept fresh.
    Comment,
}

/// What the orchestrator must do after a mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// Show interaction/highlight layers, signal the crosshair cursor, force
    /// a position pass now and schedule another at the given instant.
    EnteredComment { settle_refresh_at: Instant },
    /// Hide the layers; no recomputation until comment mode returns.
    EnteredNormal,
    /// Re-entered the current state: at most a best-effort refresh.
    Refresh,
    /// Re-entered the current state: nothing to do.
    NoOp,
}

/// Owns the mode flag. The only two transitions are `normal -> comment` and
/// its inverse; both are idempotent.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    settle_delay: Duration,
}

impl ModeController {
    pub fn new() -> Self {
        Self { mode: Mode::Normal, settle_delay: SETTLE_REFRESH_DELAY }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_comment(&self) -> bool {
        self.mode == Mode::Comment
    }

    /// Transition to `mode`, returning the side effects the caller must
    /// apply.
    pub fn set(&mut self, mode: Mode, now: Instant) -> ModeChange {
        match (self.mode, mode) {
            (Mode::Normal, Mode::Comment) => {
                self.mode = Mode::Comment;
                ModeChange::EnteredComment { settle_refresh_at: now + self.settle_delay }
            }
            (Mode::Comment, Mode::Normal) => {
                self.mode = Mode::Normal;
                ModeChange::EnteredNormal
            }
            (Mode::Comment, Mode::Comment) => ModeChange::Refresh,
            (Mode::Normal, Mode::Normal) => ModeChange::NoOp,
        }
    }
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_normal_mode() {
        let controller = ModeController::new();
        assert_eq!(controller.mode(), Mode::Normal);
        assert!(!controller.is_comment());
    }

    #[test]
    fn entering_comment_schedules_the_settle_refresh() {
        let mut controller = ModeController::new().with_settle_delay(Duration::from_millis(500));
        let now = Instant::now();

        let change = controller.set(Mode::Comment, now);
        assert_eq!(
            change,
            ModeChange::EnteredComment { settle_refresh_at: now + Duration::from_millis(500) }
        );
        assert!(controller.is_comment());
    }

    #[test]
    fn leaving_comment_hides_layers() {
        let mut controller = ModeController::new();
        let now = Instant::now();

        controller.set(Mode::Comment, now);
        assert_eq!(controller.set(Mode::Normal, now), ModeChange::EnteredNormal);
        assert_eq!(controller.mode(), Mode::Normal);
    }

    #[test]
    fn reentry_is_idempotent() {
        let mut controller = ModeController::new();
        let now = Instant::now();

        assert_eq!(controller.set(Mode::Normal, now), ModeChange::NoOp);

        controller.set(Mode::Comment, now);
        assert_eq!(controller.set(Mode::Comment, now), ModeChange::Refresh);
        assert!(controller.is_comment());
    }
}
