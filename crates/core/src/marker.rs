//! Marker collaborator contract
//!
//! A marker handle is the live UI proxy for one comment's on-page indicator,
//! bound 1:1 to a comment id and owned exclusively by the manager. Handles
//! receive plain position/visibility updates and tear their visuals down on
//! drop; they never hold a reference back into the manager.

use crate::comment::CommentRecord;
use overmark_dom::Point;

/// Live UI proxy for one comment marker.
pub trait MarkerHandle {
    fn set_position(&mut self, position: Point);

    fn set_visible(&mut self, visible: bool);
}

/// Creates marker handles when comments are loaded or newly authored.
pub trait MarkerFactory {
    fn create(&mut self, comment: &CommentRecord) -> Box<dyn MarkerHandle>;
}

/// Factory producing inert handles, for headless embeddings.
#[derive(Debug, Default)]
pub struct NoopMarkerFactory;

struct NoopMarker;

impl MarkerHandle for NoopMarker {
    fn set_position(&mut self, _position: Point) {}

    fn set_visible(&mut self, _visible: bool) {}
}

impl MarkerFactory for NoopMarkerFactory {
    fn create(&mut self, _comment: &CommentRecord) -> Box<dyn MarkerHandle> {
        Box::new(NoopMarker)
    }
}
