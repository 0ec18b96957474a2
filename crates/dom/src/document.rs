//! Element tree model and the read-only view trait
//!
//! The annotation engine never holds direct element references across frames;
//! it re-queries through [`DocumentView`] every time it needs layout or
//! structure. [`DomTree`] is an arena-backed implementation: detaching a node
//! keeps its slot alive, so a stale [`NodeId`] stays answerable (and reports
//! itself as disconnected) instead of dangling.

use std::collections::HashMap;

/// Opaque handle to one element in a document tree.
///
/// Only ever minted by the tree that owns the element. Handles stay usable
/// after the element is detached; they simply stop being connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Viewport-relative bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

/// Absolute viewport position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Subset of the CSS `display` property the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Visible,
    None,
}

/// Subset of the CSS `visibility` property the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Read-only element-tree interface consumed by the rest of the engine.
///
/// Everything is keyed by [`NodeId`] and answered from current state; callers
/// must not cache layout across frames.
pub trait DocumentView {
    fn root(&self) -> NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> &[NodeId];

    /// Lowercase tag name of the element.
    fn tag_name(&self, node: NodeId) -> &str;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Current bounding box. Zero-sized for detached elements.
    fn bounding_rect(&self, node: NodeId) -> Rect;

    /// Whether the element is reachable from the document root.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Whether the element or any ancestor is hidden via display or
    /// visibility.
    fn is_hidden(&self, node: NodeId) -> bool;

    /// Whether `node` is `ancestor` itself or lies in its subtree.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }
}

#[derive(Debug)]
struct ElementNode {
    tag: String,
    attributes: HashMap<String, String>,
    rect: Rect,
    display: Display,
    visibility: Visibility,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed element tree implementing [`DocumentView`].
///
/// Mutation methods cover what the engine's tests and headless embeddings
/// need: appending elements, detaching subtrees, and updating attributes,
/// layout rects, and style flags.
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<ElementNode>,
    root: NodeId,
}

impl DomTree {
    /// Create a tree containing a single root element.
    pub fn new(root_tag: impl Into<String>) -> Self {
        let root_node = ElementNode {
            tag: root_tag.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            display: Display::Visible,
            visibility: Visibility::Visible,
            parent: None,
            children: Vec::new(),
        };

        Self { nodes: vec![root_node], root: NodeId(0) }
    }

    /// Append a new child element under `parent` and return its handle.
    pub fn append_child(&mut self, parent: NodeId, tag: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ElementNode {
            tag: tag.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            rect: Rect::new(0.0, 0.0, 0.0, 0.0),
            display: Display::Visible,
            visibility: Visibility::Visible,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Detach `node` (and with it, its subtree) from the document.
    ///
    /// The slot stays allocated so existing handles keep answering queries;
    /// they report as disconnected. Detaching the root is a no-op.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|&child| child != node);
    }

    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        self.nodes[node.0].attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attributes.remove(name);
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.nodes[node.0].rect = rect;
    }

    pub fn set_display(&mut self, node: NodeId, display: Display) {
        self.nodes[node.0].display = display;
    }

    pub fn set_visibility(&mut self, node: NodeId, visibility: Visibility) {
        self.nodes[node.0].visibility = visibility;
    }
}

impl DocumentView for DomTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn tag_name(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.nodes[node.0].rect
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            let element = &self.nodes[candidate.0];
            if element.display == Display::None || element.visibility == Visibility::Hidden {
                return true;
            }
            current = element.parent;
        }
        false
    }
}
