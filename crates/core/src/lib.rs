//! Annotation engine core
//!
//! Owns the comment collection and marker-handle registry, and composes the
//! mode controller, overlay coordinator, and change watcher into the
//! create/reply/status/delete/navigate operations of the annotation layer.
//! Persistence, marker visuals, and surface visuals are injected
//! collaborators behind the traits in [`store`] and [`marker`].

mod comment;
mod context;
mod manager;
mod marker;
mod store;

pub use comment::{now_ms, CommentDraft, CommentId, CommentRecord, CommentStatus};
pub use context::SharedContext;
pub use manager::{
    AnnotationManager, ClickAction, ReplyNotifier, POSITION_CACHE_CAPACITY, WIDGET_ID_PREFIX,
    WIDGET_MARKER_ATTRIBUTE,
};
pub use marker::{MarkerFactory, MarkerHandle, NoopMarkerFactory};
pub use store::{CommentStore, MemoryStore, StoreError};
