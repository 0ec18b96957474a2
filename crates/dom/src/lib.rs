//! Document-tree model, element locators, and anchor geometry
//!
//! This crate is the seam between the annotation engine and whatever document
//! it is overlaid on. The engine only ever talks to [`DocumentView`], an
//! element-tree read interface; [`DomTree`] is the bundled implementation used
//! by tests and headless embeddings, and a browser adapter can implement the
//! same trait against a live page.

mod document;
mod geometry;
mod locator;

pub use document::{Display, DocumentView, DomTree, NodeId, Point, Rect, Visibility};
pub use geometry::{constrain_to_viewport, to_absolute, to_relative, Anchor, PreferredSide, Size, Viewport};
pub use locator::{is_valid, path_of, resolve, LocatorError};
