//! End-to-end annotation flow over an in-memory document and store.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use overmark_core::{
    AnnotationManager, ClickAction, CommentId, CommentRecord, CommentStatus, MarkerFactory,
    MarkerHandle, MemoryStore,
};
use overmark_dom::{DocumentView, DomTree, NodeId, Point, Rect};
use overmark_overlay::{Mode, Surface, SurfaceKind};
use overmark_watcher::PageSignal;

const PAGE: &str = "https://example.test/pricing";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MarkerState {
    position: Option<Point>,
    visible: bool,
}

#[derive(Default)]
struct MarkerBoard {
    states: RefCell<HashMap<CommentId, MarkerState>>,
}

impl MarkerBoard {
    fn state(&self, id: CommentId) -> MarkerState {
        self.states.borrow().get(&id).copied().unwrap_or_default()
    }
}

struct RecordingMarker {
    id: CommentId,
    board: Rc<MarkerBoard>,
}

impl MarkerHandle for RecordingMarker {
    fn set_position(&mut self, position: Point) {
        self.board.states.borrow_mut().entry(self.id).or_default().position = Some(position);
    }

    fn set_visible(&mut self, visible: bool) {
        self.board.states.borrow_mut().entry(self.id).or_default().visible = visible;
    }
}

impl Drop for RecordingMarker {
    fn drop(&mut self) {
        self.board.states.borrow_mut().remove(&self.id);
    }
}

struct RecordingFactory {
    board: Rc<MarkerBoard>,
}

impl MarkerFactory for RecordingFactory {
    fn create(&mut self, comment: &CommentRecord) -> Box<dyn MarkerHandle> {
        self.board.states.borrow_mut().insert(comment.id, MarkerState::default());
        Box::new(RecordingMarker { id: comment.id, board: Rc::clone(&self.board) })
    }
}

struct StubSurface {
    kind: SurfaceKind,
    root: NodeId,
}

impl Surface for StubSurface {
    fn kind(&self) -> SurfaceKind {
        self.kind
    }

    fn root(&self) -> NodeId {
        self.root
    }
}

fn pricing_page() -> (DomTree, NodeId) {
    let mut doc = DomTree::new("html");
    let body = doc.append_child(doc.root(), "body");
    let plans = doc.append_child(body, "section");
    doc.set_attribute(plans, "id", "plans");
    doc.set_rect(plans, Rect::new(100.0, 200.0, 50.0, 20.0));
    (doc, plans)
}

fn manager(store: MemoryStore) -> (AnnotationManager, Rc<MarkerBoard>) {
    let board = Rc::new(MarkerBoard::default());
    let manager = AnnotationManager::new(
        PAGE,
        Box::new(store),
        Box::new(RecordingFactory { board: Rc::clone(&board) }),
    );
    (manager, board)
}

#[test]
fn full_review_session() {
    let (mut doc, plans) = pricing_page();
    let (mut session, board) = manager(MemoryStore::new());
    let mut now = Instant::now();

    // Fresh page: nothing stored, nothing rendered.
    assert_eq!(session.load_comments(&doc).unwrap(), 0);
    assert!(!session.layers_visible());

    // Enter comment mode and click the plans section at (110, 205).
    session.set_mode(&doc, Mode::Comment, now);
    assert!(session.layers_visible());
    assert!(session.crosshair_cursor());

    let action = session.handle_click(&doc, plans, now);
    let ClickAction::InterceptedForCreate { element } = action else {
        panic!("comment mode should intercept page clicks, got {action:?}");
    };

    let form_root = doc.append_child(doc.root(), "form");
    session.open_surface(Box::new(StubSurface { kind: SurfaceKind::Form, root: form_root }), now);

    let comment_id = session
        .create_comment(
            &doc,
            element,
            "annual price is stale".to_owned(),
            "dana".to_owned(),
            "reviewer".to_owned(),
            Point::new(110.0, 205.0),
        )
        .expect("creation should persist");
    assert!(!session.has_active_surface());

    let comment = session.get_comment(comment_id).unwrap();
    assert_eq!(comment.locator, "//*[@id=\"plans\"]");
    assert_eq!((comment.anchor.fx, comment.anchor.fy), (0.2, 0.25));

    // The section moves (scroll): the marker follows on the leading edge.
    now += Duration::from_millis(50);
    doc.set_rect(plans, Rect::new(100.0, 120.0, 50.0, 20.0));
    session.handle_signal(&doc, PageSignal::Scroll, now);
    assert_eq!(board.state(comment_id).position, Some(Point::new(110.0, 125.0)));

    // Reply through the detail modal; the thread grows but stays anchored
    // where the parent is.
    let notified = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&notified);
    let mut session = session.with_reply_notifier(Box::new(move |id| sink.borrow_mut().push(id)));

    let reply_id = session
        .add_reply(&doc, comment_id, "fixed in staging".to_owned(), "lee".to_owned(), Vec::new())
        .expect("reply should persist");
    let thread = session.get_comment(comment_id).unwrap();
    assert_eq!(thread.replies[0].id, reply_id);
    assert_eq!(thread.replies[0].locator, thread.locator);
    assert_eq!(notified.borrow().as_slice(), [comment_id]);

    // Resolve, then archive. Archiving hides the marker for good.
    assert!(session.change_status(comment_id, CommentStatus::Done));
    assert!(session.get_comment(comment_id).unwrap().resolved_at.is_some());
    assert!(board.state(comment_id).visible);

    assert!(session.change_status(comment_id, CommentStatus::Archived));
    assert!(!board.state(comment_id).visible);

    // Escape leaves comment mode once no surface is up.
    now += Duration::from_millis(10);
    session.handle_escape(&doc, now);
    assert_eq!(session.mode(), Mode::Normal);
}

#[test]
fn comments_survive_a_reload() {
    let (doc, plans) = pricing_page();

    // First session writes one comment, then hands the store over.
    let first_store = MemoryStore::new();
    let (mut first, _) = manager(first_store);
    first
        .create_comment(
            &doc,
            plans,
            "persists across sessions".to_owned(),
            "dana".to_owned(),
            "reviewer".to_owned(),
            Point::new(125.0, 210.0),
        )
        .unwrap();
    let carried = MemoryStore::with_comments(first.comments().to_vec());
    first.destroy();

    // Second session loads it back and renders the marker at the anchor.
    let (mut second, board) = manager(carried);
    assert_eq!(second.load_comments(&doc).unwrap(), 1);

    let restored = &second.comments()[0];
    assert_eq!(restored.content, "persists across sessions");
    assert_eq!(board.state(restored.id).position, Some(Point::new(125.0, 210.0)));
}
