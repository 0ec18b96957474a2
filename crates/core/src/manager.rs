//! Annotation manager: the orchestrator
//!
//! Owns the comment collection (URL-filtered at load), the marker-handle
//! registry, and the mode/overlay/watcher instances, and wires them into the
//! public create/reply/status/delete operations. Collaborators are injected:
//! persistence through [`CommentStore`], marker visuals through
//! [`MarkerFactory`], the reply broadcast through [`ReplyNotifier`], and the
//! click-suppression flag through [`SharedContext`].
//!
//! Failure behavior is deliberately quiet: persistence rejections and
//! unresolvable anchors are logged and degrade to an unchanged list or a
//! hidden marker, never an interruption of the annotation workflow.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

use overmark_dom::{
    is_valid, path_of, resolve, to_absolute, to_relative, DocumentView, NodeId, Point,
};
use overmark_overlay::{
    ClickOutcome, EscapeOutcome, Mode, ModeChange, ModeController, OverlayCoordinator, Surface,
};
use overmark_scheduler::{FrameBatcher, LruCache};
use overmark_watcher::{widget_subtree_predicate, ChangeWatcher, PageSignal, Recompute, WatchGate};
use tracing::{debug, warn};

use crate::comment::{now_ms, CommentDraft, CommentId, CommentRecord, CommentStatus};
use crate::context::SharedContext;
use crate::marker::{MarkerFactory, MarkerHandle};
use crate::store::CommentStore;

/// Attribute marking every element the widget itself injects; mutations under
/// such elements are ignored to avoid observer feedback loops.
pub const WIDGET_MARKER_ATTRIBUTE: &str = "data-overmark";

/// Id prefix with the same meaning as [`WIDGET_MARKER_ATTRIBUTE`].
pub const WIDGET_ID_PREFIX: &str = "overmark-";

/// Capacity of the advisory marker-position cache.
pub const POSITION_CACHE_CAPACITY: usize = 256;

/// Broadcast fired after a reply is appended, carrying the parent comment id
/// so an open detail surface can re-fetch its thread. The only
/// inter-component channel besides direct calls.
pub type ReplyNotifier = Box<dyn Fn(CommentId)>;

/// What the manager decided about a dispatched click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Swallowed by the shared click-suppression flag.
    Suppressed,
    /// Landed before the outside-click listener armed (the opening click).
    Ignored,
    /// Landed inside the active surface.
    OnSurface,
    /// Landed outside the active surface and closed it.
    ClosedSurface,
    /// Comment mode intercepted the click for comment creation on the target.
    InterceptedForCreate { element: NodeId },
    /// Normal mode, nothing active: the page's click to handle.
    PassThrough,
}

/// Orchestrates anchoring, position synchronization, mode, and overlays for
/// one page.
pub struct AnnotationManager {
    page_url: String,
    store: Box<dyn CommentStore>,
    marker_factory: Box<dyn MarkerFactory>,
    comments: Vec<CommentRecord>,
    markers: HashMap<CommentId, Box<dyn MarkerHandle>>,
    mode: ModeController,
    coordinator: OverlayCoordinator,
    watcher: ChangeWatcher,
    frame: FrameBatcher,
    pending_recompute: Option<Recompute>,
    position_cache: LruCache<CommentId, Point>,
    context: Rc<SharedContext>,
    reply_notifier: Option<ReplyNotifier>,
    settle_refresh_at: Option<Instant>,
}

impl AnnotationManager {
    pub fn new(
        page_url: impl Into<String>,
        store: Box<dyn CommentStore>,
        marker_factory: Box<dyn MarkerFactory>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            store,
            marker_factory,
            comments: Vec::new(),
            markers: HashMap::new(),
            mode: ModeController::new(),
            coordinator: OverlayCoordinator::new(),
            watcher: ChangeWatcher::new().with_ignore_predicate(widget_subtree_predicate(
                WIDGET_MARKER_ATTRIBUTE,
                WIDGET_ID_PREFIX,
            )),
            frame: FrameBatcher::default(),
            pending_recompute: None,
            position_cache: LruCache::new(POSITION_CACHE_CAPACITY),
            context: Rc::new(SharedContext::new()),
            reply_notifier: None,
            settle_refresh_at: None,
        }
    }

    /// Share an externally owned context instead of the manager's own.
    pub fn with_context(mut self, context: Rc<SharedContext>) -> Self {
        self.context = context;
        self
    }

    pub fn with_reply_notifier(mut self, notifier: ReplyNotifier) -> Self {
        self.reply_notifier = Some(notifier);
        self
    }

    pub fn context(&self) -> &Rc<SharedContext> {
        &self.context
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn get_comment(&self, id: CommentId) -> Option<&CommentRecord> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    /// Interaction/highlight layers are shown exactly in comment mode.
    pub fn layers_visible(&self) -> bool {
        self.mode.is_comment()
    }

    /// Crosshair pointer affordance, signaled while comment mode is active.
    pub fn crosshair_cursor(&self) -> bool {
        self.mode.is_comment()
    }

    pub fn has_active_surface(&self) -> bool {
        self.coordinator.has_active_surface()
    }

    /// Load the full comment set, keep this page's comments, and materialize
    /// one marker handle per survivor. Ends with a forced position pass so
    /// markers are correct the first time comment mode is entered.
    ///
    /// Returns the number of comments kept.
    pub fn load_comments(&mut self, doc: &dyn DocumentView) -> Result<usize, crate::StoreError> {
        let mut loaded = self.store.load_comments()?;
        loaded.retain(|record| record.page_url == self.page_url);
        for record in &mut loaded {
            record.normalize_loaded();
        }

        self.markers.clear();
        self.position_cache.invalidate_all();
        for record in &loaded {
            self.markers.insert(record.id, self.marker_factory.create(record));
        }
        self.comments = loaded;

        self.refresh_positions(doc, true);
        debug!(count = self.comments.len(), page_url = %self.page_url, "comments loaded");
        Ok(self.comments.len())
    }

    /// Create a comment anchored where the user clicked on `element`.
    ///
    /// The locator and fractional anchor are computed from the live element;
    /// the store assigns id and timestamp. On rejection the form surface is
    /// still closed but the in-memory list stays unchanged.
    pub fn create_comment(
        &mut self,
        doc: &dyn DocumentView,
        element: NodeId,
        content: String,
        author: String,
        role: String,
        click: Point,
    ) -> Option<CommentId> {
        let locator = path_of(doc, element);
        let anchor = to_relative(&doc.bounding_rect(element), click);
        let draft = CommentDraft {
            content,
            locator,
            page_url: self.page_url.clone(),
            anchor,
            absolute_position: Some(click),
            created_by: author,
            role,
            attachments: Vec::new(),
        };

        let result = self.store.save_comment(draft);
        self.coordinator.close_active();

        match result {
            Ok(record) => {
                let id = record.id;
                let mut marker = self.marker_factory.create(&record);
                let position = to_absolute(&doc.bounding_rect(element), record.anchor);
                marker.set_position(position);
                marker.set_visible(self.mode.is_comment());
                self.markers.insert(id, marker);
                self.position_cache.insert(id, position);
                self.comments.push(record);
                Some(id)
            }
            Err(error) => {
                warn!(%error, "failed to persist new comment, list unchanged");
                None
            }
        }
    }

    /// Append a reply to `parent_id`'s thread.
    ///
    /// The reply gets a new id and fresh timestamp but inherits the
    /// *parent's* locator and anchor; replies never anchor to the reply
    /// form's location. The updated parent is persisted before the local
    /// thread changes; afterwards the parent marker is refreshed and the
    /// reply broadcast fires.
    pub fn add_reply(
        &mut self,
        doc: &dyn DocumentView,
        parent_id: CommentId,
        content: String,
        author: String,
        attachments: Vec<serde_json::Value>,
    ) -> Option<CommentId> {
        let Some(index) = self.comments.iter().position(|comment| comment.id == parent_id) else {
            warn!(%parent_id, "reply target not found");
            return None;
        };

        let parent = &self.comments[index];
        let reply = CommentRecord {
            id: CommentId::new_v4(),
            content,
            locator: parent.locator.clone(),
            page_url: parent.page_url.clone(),
            anchor: parent.anchor,
            absolute_position: parent.absolute_position,
            created_at: now_ms(),
            created_by: author,
            role: String::new(),
            status: CommentStatus::New,
            resolved_at: None,
            archived_at: None,
            replies: Vec::new(),
            attachments,
        };
        let reply_id = reply.id;

        let mut updated = parent.clone();
        updated.replies.push(reply);

        match self.store.update_comment(&updated) {
            Ok(()) => {
                self.comments[index] = updated;
                // Only the parent's marker is touched; the rest of the
                // collection keeps its mode-dependent freeze.
                self.refresh_marker(doc, index);
                if let Some(notify) = &self.reply_notifier {
                    notify(parent_id);
                }
                Some(reply_id)
            }
            Err(error) => {
                warn!(%parent_id, %error, "failed to persist reply, thread unchanged");
                None
            }
        }
    }

    /// Move a comment through the workflow. Entering `Done` stamps
    /// `resolved_at`; entering `Archived` stamps `archived_at` and hides the
    /// marker immediately (archived comments never render, in either mode).
    pub fn change_status(&mut self, id: CommentId, status: CommentStatus) -> bool {
        let Some(index) = self.comments.iter().position(|comment| comment.id == id) else {
            warn!(%id, "status change target not found");
            return false;
        };
        if self.comments[index].status == status {
            return true;
        }

        let mut updated = self.comments[index].clone();
        updated.status = status;
        match status {
            CommentStatus::Done => updated.resolved_at = Some(now_ms()),
            CommentStatus::Archived => updated.archived_at = Some(now_ms()),
            _ => {}
        }

        match self.store.update_comment(&updated) {
            Ok(()) => {
                self.comments[index] = updated;
                if status == CommentStatus::Archived {
                    if let Some(marker) = self.markers.get_mut(&id) {
                        marker.set_visible(false);
                    }
                    self.position_cache.remove(&id);
                }
                true
            }
            Err(error) => {
                warn!(%id, %error, "failed to persist status change");
                false
            }
        }
    }

    /// Delete a comment. The store is asked first; only on success are the
    /// record and its marker handle removed. Any confirmation surface is
    /// closed either way.
    pub fn delete_comment(&mut self, id: CommentId) -> bool {
        let result = self.store.delete_comment(id);
        self.coordinator.close_active();

        match result {
            Ok(()) => {
                self.comments.retain(|comment| comment.id != id);
                self.markers.remove(&id);
                self.position_cache.remove(&id);
                true
            }
            Err(error) => {
                warn!(%id, %error, "deletion rejected, keeping comment");
                false
            }
        }
    }

    /// Switch interaction mode and apply the transition's side effects.
    pub fn set_mode(&mut self, doc: &dyn DocumentView, mode: Mode, now: Instant) {
        match self.mode.set(mode, now) {
            ModeChange::EnteredComment { settle_refresh_at } => {
                // Second pass absorbs late layout settling (font loads etc).
                self.settle_refresh_at = Some(settle_refresh_at);
                self.refresh_positions(doc, true);
            }
            ModeChange::Refresh => self.refresh_positions(doc, true),
            ModeChange::EnteredNormal => {
                self.settle_refresh_at = None;
            }
            ModeChange::NoOp => {}
        }
    }

    /// Show a form or modal. The coordinator closes whatever was active
    /// first; at most one surface is ever up.
    pub fn open_surface(&mut self, surface: Box<dyn Surface>, now: Instant) {
        self.coordinator.open(surface, now);
    }

    pub fn close_active_surface(&mut self) -> bool {
        self.coordinator.close_active()
    }

    /// Escape: an active surface always consumes the key; only when nothing
    /// is active does Escape fall through to leaving comment mode.
    pub fn handle_escape(&mut self, doc: &dyn DocumentView, now: Instant) {
        if self.coordinator.handle_escape() == EscapeOutcome::Propagate && self.mode.is_comment() {
            self.set_mode(doc, Mode::Normal, now);
        }
    }

    /// Dispatch a click (mouse or normalized touch tap).
    pub fn handle_click(&mut self, doc: &dyn DocumentView, target: NodeId, now: Instant) -> ClickAction {
        if self.context.take_click_suppression() {
            return ClickAction::Suppressed;
        }

        match self.coordinator.handle_click(doc, target, now) {
            ClickOutcome::ClosedSurface => ClickAction::ClosedSurface,
            ClickOutcome::Inside => ClickAction::OnSurface,
            ClickOutcome::NotYetArmed => ClickAction::Ignored,
            ClickOutcome::NoActiveSurface => {
                if self.mode.is_comment() {
                    ClickAction::InterceptedForCreate { element: target }
                } else {
                    ClickAction::PassThrough
                }
            }
        }
    }

    /// Feed a page signal (scroll/resize/orientation/mutation) through the
    /// change watcher.
    ///
    /// A leading-edge scroll release applies immediately; the throttle
    /// already paces those at frame cadence. Everything else surfaces as
    /// trailing work through [`poll`](Self::poll).
    pub fn handle_signal(&mut self, doc: &dyn DocumentView, signal: PageSignal, now: Instant) {
        let gate = self.gate();
        if let Some(recompute) = self.watcher.observe(doc, signal, gate, now) {
            self.apply_recompute(doc, recompute);
        }
    }

    /// Drive pending timers: the post-mode-entry settle refresh, trailing
    /// throttle/debounce releases, and the frame batch that coalesces them.
    /// Call once per event-loop turn.
    ///
    /// Trailing releases do not touch layout directly; they are queued on
    /// the frame batcher, so several limiters firing in the same frame
    /// (scroll catch-up, resize settle, mutation quiet period) collapse into
    /// one position pass at the next frame boundary.
    pub fn poll(&mut self, doc: &dyn DocumentView, now: Instant) {
        if let Some(at) = self.settle_refresh_at {
            if now >= at {
                self.settle_refresh_at = None;
                if self.mode.is_comment() {
                    self.refresh_positions(doc, true);
                }
            }
        }

        let gate = self.gate();
        if let Some(recompute) = self.watcher.poll(gate, now) {
            self.queue_recompute(recompute, now);
        }

        if !gate.is_active() {
            // No stale batch may fire after the page leaves comment mode.
            self.frame.cancel();
            self.pending_recompute = None;
        } else if self.frame.poll(now).is_some() {
            if let Some(recompute) = self.pending_recompute.take() {
                self.apply_recompute(doc, recompute);
            }
        }
    }

    /// Tear down: close surfaces, drop every marker handle, forget state.
    pub fn destroy(&mut self) {
        self.coordinator.close_active();
        self.markers.clear();
        self.comments.clear();
        self.position_cache.invalidate_all();
        self.frame.cancel();
        self.pending_recompute = None;
        self.settle_refresh_at = None;
        self.mode = ModeController::new();
    }

    fn gate(&self) -> WatchGate {
        WatchGate {
            markers_present: !self.markers.is_empty(),
            comment_mode: self.mode.is_comment(),
        }
    }

    /// Fold a trailing recompute into the current frame batch.
    fn queue_recompute(&mut self, recompute: Recompute, now: Instant) {
        let invalidate_cache = self
            .pending_recompute
            .map_or(recompute.invalidate_cache, |pending| {
                pending.invalidate_cache || recompute.invalidate_cache
            });
        self.pending_recompute = Some(Recompute { invalidate_cache });
        self.frame.request(now);
    }

    fn apply_recompute(&mut self, doc: &dyn DocumentView, recompute: Recompute) {
        if recompute.invalidate_cache {
            self.position_cache.invalidate_all();
        }
        self.refresh_positions(doc, false);
    }

    /// Recompute every marker position from live layout.
    ///
    /// The mode-gated variant (`forced == false`) does nothing in normal
    /// mode; markers stay frozen there until comment mode returns. The
    /// forced variant ignores the gate (used right after load and on mode
    /// entry) but both hide markers whose anchor is archived, unresolvable,
    /// or invalid.
    fn refresh_positions(&mut self, doc: &dyn DocumentView, forced: bool) {
        if !forced && !self.mode.is_comment() {
            return;
        }

        for index in 0..self.comments.len() {
            self.refresh_marker(doc, index);
        }
    }

    /// Reposition the single marker belonging to `comments[index]`.
    fn refresh_marker(&mut self, doc: &dyn DocumentView, index: usize) {
        let record = &mut self.comments[index];
        let Some(marker) = self.markers.get_mut(&record.id) else {
            return;
        };

        if record.is_archived() {
            marker.set_visible(false);
            return;
        }

        let anchor_element = resolve(doc, &record.locator).filter(|node| is_valid(doc, *node));
        match anchor_element {
            Some(node) => {
                let position = to_absolute(&doc.bounding_rect(node), record.anchor);
                marker.set_position(position);
                marker.set_visible(true);
                record.absolute_position = Some(position);
                self.position_cache.insert(record.id, position);
            }
            None => marker.set_visible(false),
        }
    }
}
