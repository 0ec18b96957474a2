//! Change watcher: page-event aggregation for position recomputation
//!
//! Folds four trigger sources (scroll, resize, orientation change, and
//! filtered DOM mutation) into a single "positions may be stale" output,
//! each source independently rate-limited. Both entry points are gated on a
//! [`WatchGate`]: without markers, or outside comment mode, the watcher does
//! zero work, which is the engine's primary cost control.
//!
//! Mutation records pass a pluggable ignore predicate before arming the
//! debounce, so mutations caused by the widget's own DOM writes never feed
//! back into recomputation. Tests swap in trivial predicates without
//! building a real document.

use std::time::Instant;

use overmark_dom::{DocumentView, NodeId};
use overmark_scheduler::{Debounce, Throttle};
use tracing::debug;

/// One observed DOM mutation, reduced to the node it targeted.
#[derive(Debug, Clone, Copy)]
pub struct MutationRecord {
    pub target: NodeId,
}

/// A page event that may have moved comment anchors.
#[derive(Debug, Clone, Copy)]
pub enum PageSignal {
    Scroll,
    Resize,
    OrientationChange,
    Mutation(MutationRecord),
}

/// Preconditions for the watcher to do any work at all.
#[derive(Debug, Clone, Copy)]
pub struct WatchGate {
    /// At least one marker handle exists.
    pub markers_present: bool,
    /// The mode controller is currently in comment mode.
    pub comment_mode: bool,
}

impl WatchGate {
    pub fn is_active(&self) -> bool {
        self.markers_present && self.comment_mode
    }
}

/// A released recomputation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recompute {
    /// Set when the whole layout may have shifted (resize/orientation), in
    /// which case cached pixel positions must be dropped.
    pub invalidate_cache: bool,
}

/// Decides whether a mutation originated inside the widget's own subtree and
/// should therefore be ignored. Returns `true` to drop the record.
pub type IgnorePredicate = Box<dyn Fn(&dyn DocumentView, &MutationRecord) -> bool>;

/// Ignore predicate matching the widget's reserved marker attribute or id
/// prefix on the mutation target or any of its ancestors.
pub fn widget_subtree_predicate(marker_attribute: &'static str, id_prefix: &'static str) -> IgnorePredicate {
    Box::new(move |doc, record| {
        let mut current = Some(record.target);
        while let Some(node) = current {
            if doc.attribute(node, marker_attribute).is_some() {
                return true;
            }
            if doc.attribute(node, "id").is_some_and(|id| id.starts_with(id_prefix)) {
                return true;
            }
            current = doc.parent(node);
        }
        false
    })
}

/// Aggregates rate-limited page signals into recompute requests.
pub struct ChangeWatcher {
    scroll: Throttle,
    settle: Debounce,
    mutation: Debounce,
    ignore: IgnorePredicate,
}

impl ChangeWatcher {
    /// Watcher with default rate limits and a keep-everything mutation
    /// filter.
    pub fn new() -> Self {
        Self {
            scroll: Throttle::for_scroll(),
            settle: Debounce::default(),
            mutation: Debounce::default(),
            ignore: Box::new(|_, _| false),
        }
    }

    pub fn with_ignore_predicate(mut self, ignore: IgnorePredicate) -> Self {
        self.ignore = ignore;
        self
    }

    /// Feed one page signal through its rate limiter.
    ///
    /// Scroll may fire immediately (leading edge); resize, orientation, and
    /// mutation only ever arm a trailing debounce picked up by
    /// [`poll`](Self::poll). Inactive gates drop the signal outright.
    pub fn observe(
        &mut self,
        doc: &dyn DocumentView,
        signal: PageSignal,
        gate: WatchGate,
        now: Instant,
    ) -> Option<Recompute> {
        if !gate.is_active() {
            return None;
        }

        match signal {
            PageSignal::Scroll => {
                if self.scroll.fire(now) {
                    return Some(Recompute { invalidate_cache: false });
                }
            }
            PageSignal::Resize | PageSignal::OrientationChange => {
                self.settle.trigger(now);
            }
            PageSignal::Mutation(record) => {
                if (self.ignore)(doc, &record) {
                    debug!(?record.target, "mutation inside widget subtree, ignored");
                } else {
                    self.mutation.trigger(now);
                }
            }
        }

        None
    }

    /// Release any due trailing work.
    ///
    /// An inactive gate clears pending timers instead of firing them: once
    /// the page leaves comment mode, no stale recompute may surface later.
    pub fn poll(&mut self, gate: WatchGate, now: Instant) -> Option<Recompute> {
        if !gate.is_active() {
            self.clear_pending();
            return None;
        }

        let mut fired = false;
        let mut invalidate_cache = false;

        if self.scroll.poll(now) {
            fired = true;
        }
        if self.settle.poll(now) {
            fired = true;
            invalidate_cache = true;
        }
        if self.mutation.poll(now) {
            fired = true;
        }

        fired.then_some(Recompute { invalidate_cache })
    }

    fn clear_pending(&mut self) {
        self.scroll.reset();
        self.settle.cancel();
        self.mutation.cancel();
    }
}

impl Default for ChangeWatcher {
    fn default() -> Self {
        Self::new()
    }
}
