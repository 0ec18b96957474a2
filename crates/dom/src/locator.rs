//! Stable textual element locators
//!
//! A locator re-identifies an element across page reloads without storing a
//! live reference. Elements with an `id` attribute get a direct id locator;
//! everything else gets a structural path from the root, with 1-based sibling
//! indices only where the tag is ambiguous among its siblings.
//!
//! Resolution never surfaces an error to callers: a locator that does not
//! parse or does not match is logged and reported as "currently missing",
//! which the engine treats the same as a removed anchor.

use crate::document::{DocumentView, NodeId};
use tracing::warn;

/// Locator parse failure. Internal to resolution; callers of [`resolve`] only
/// ever see `None`.
#[derive(Debug, thiserror::Error)]
pub enum LocatorError {
    #[error("locator is empty")]
    Empty,
    #[error("locator must start with '/': {0}")]
    MissingRootSlash(String),
    #[error("malformed path step: {0}")]
    MalformedStep(String),
    #[error("sibling index must be 1-based: {0}")]
    ZeroIndex(String),
}

/// Compute the locator for a live element.
///
/// Elements with an `id` attribute yield `//*[@id="<id>"]`. Otherwise the
/// path is built root-to-leaf, e.g. `/html/body/div[2]/span`; an index is
/// emitted only when a preceding sibling shares the element's tag.
/// Deterministic for an unchanged tree.
pub fn path_of(doc: &dyn DocumentView, node: NodeId) -> String {
    if let Some(id) = doc.attribute(node, "id") {
        return format!("//*[@id=\"{id}\"]");
    }

    let mut segments = Vec::new();
    let mut current = node;
    loop {
        let tag = doc.tag_name(current).to_owned();
        match doc.parent(current) {
            Some(parent) => {
                let mut position = 1usize;
                for &sibling in doc.children(parent) {
                    if sibling == current {
                        break;
                    }
                    if doc.tag_name(sibling) == tag {
                        position += 1;
                    }
                }
                if position > 1 {
                    segments.push(format!("{tag}[{position}]"));
                } else {
                    segments.push(tag);
                }
                current = parent;
            }
            None => {
                segments.push(tag);
                break;
            }
        }
    }

    segments.reverse();
    format!("/{}", segments.join("/"))
}

/// Resolve a locator against the current document.
///
/// Returns `None` when nothing matches or the locator is malformed; the
/// latter is logged at `warn`. Never panics on caller input.
pub fn resolve(doc: &dyn DocumentView, locator: &str) -> Option<NodeId> {
    match evaluate(doc, locator) {
        Ok(found) => found,
        Err(error) => {
            warn!(locator, %error, "unresolvable locator, treating anchor as missing");
            None
        }
    }
}

/// Whether an element can currently host a visible marker: connected to the
/// document, not the root itself, and not hidden by itself or an ancestor.
pub fn is_valid(doc: &dyn DocumentView, node: NodeId) -> bool {
    doc.is_connected(node) && doc.parent(node).is_some() && !doc.is_hidden(node)
}

fn evaluate(doc: &dyn DocumentView, locator: &str) -> Result<Option<NodeId>, LocatorError> {
    if locator.is_empty() {
        return Err(LocatorError::Empty);
    }

    if let Some(id) = parse_id_locator(locator) {
        return Ok(find_by_id(doc, doc.root(), id));
    }

    let steps = parse_structural(locator)?;
    let mut steps = steps.into_iter();

    // First step addresses the root element itself.
    let Some(first) = steps.next() else {
        return Err(LocatorError::Empty);
    };
    if first.tag != doc.tag_name(doc.root()) || first.index != 1 {
        return Ok(None);
    }

    let mut current = doc.root();
    for step in steps {
        let mut seen = 0usize;
        let mut matched = None;
        for &child in doc.children(current) {
            if doc.tag_name(child) == step.tag {
                seen += 1;
                if seen == step.index {
                    matched = Some(child);
                    break;
                }
            }
        }
        match matched {
            Some(child) => current = child,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

struct PathStep {
    tag: String,
    index: usize,
}

fn parse_id_locator(locator: &str) -> Option<&str> {
    locator.strip_prefix("//*[@id=\"")?.strip_suffix("\"]")
}

fn parse_structural(locator: &str) -> Result<Vec<PathStep>, LocatorError> {
    let Some(path) = locator.strip_prefix('/') else {
        return Err(LocatorError::MissingRootSlash(locator.to_owned()));
    };

    path.split('/').map(parse_step).collect()
}

fn parse_step(step: &str) -> Result<PathStep, LocatorError> {
    if step.is_empty() {
        return Err(LocatorError::MalformedStep(step.to_owned()));
    }

    let Some(open) = step.find('[') else {
        if step.contains(']') {
            return Err(LocatorError::MalformedStep(step.to_owned()));
        }
        return Ok(PathStep { tag: step.to_ascii_lowercase(), index: 1 });
    };

    let (tag, rest) = step.split_at(open);
    let inner = rest
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| LocatorError::MalformedStep(step.to_owned()))?;
    let index: usize = inner
        .parse()
        .map_err(|_| LocatorError::MalformedStep(step.to_owned()))?;

    if tag.is_empty() {
        return Err(LocatorError::MalformedStep(step.to_owned()));
    }
    if index == 0 {
        return Err(LocatorError::ZeroIndex(step.to_owned()));
    }

    Ok(PathStep { tag: tag.to_ascii_lowercase(), index })
}

fn find_by_id(doc: &dyn DocumentView, node: NodeId, id: &str) -> Option<NodeId> {
    if doc.attribute(node, "id") == Some(id) {
        return Some(node);
    }
    for &child in doc.children(node) {
        if let Some(found) = find_by_id(doc, child, id) {
            return Some(found);
        }
    }
    None
}
