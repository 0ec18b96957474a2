//! Comment data model
//!
//! A comment is pinned to an element through a textual locator plus a
//! fractional anchor point inside that element's bounding box. The anchor is
//! never mutated after creation; the stored absolute position is an advisory
//! snapshot only and is always recomputed from the live rect before use.
//! Replies are full records nested under their parent and always share the
//! parent's locator and anchor.

use overmark_dom::{Anchor, Point};
use tracing::warn;

/// Stable unique comment identifier, generated as UUID v4.
pub type CommentId = uuid::Uuid;

/// Current epoch time in milliseconds.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn placeholder_author() -> String {
    "Unknown".to_owned()
}

/// Workflow status of a comment thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommentStatus {
    /// Freshly filed issue. Accepts the legacy `bug` spelling on load.
    #[default]
    #[serde(alias = "bug")]
    New,
    FeatureRequest,
    DevCompleted,
    Done,
    Archived,
}

/// One persisted comment, including its reply thread.
///
/// Field names serialize camelCase to match the stored JSON document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: CommentId,
    pub content: String,
    /// Textual path re-identifying the anchor element (see `overmark-dom`).
    pub locator: String,
    /// Page the comment belongs to; markers only materialize on URL match.
    pub page_url: String,
    /// Fractional pin point within the anchor element's bounding box.
    /// Never mutated after creation except by explicit reposition logic.
    pub anchor: Anchor,
    /// Last-known pixel snapshot. Advisory only; never trusted once the
    /// element may have moved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_position: Option<Point>,
    pub created_at: i64,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: CommentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<i64>,
    /// Ordered reply thread; replies share the parent's locator and anchor.
    #[serde(default)]
    pub replies: Vec<CommentRecord>,
    /// Opaque upload-collaborator payloads, forwarded untouched.
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
}

impl CommentRecord {
    pub fn is_archived(&self) -> bool {
        self.status == CommentStatus::Archived
    }

    /// Repair a loaded record in place: missing author fields get a
    /// placeholder rather than crashing rendering. Recurses into replies.
    pub fn normalize_loaded(&mut self) {
        if self.created_by.trim().is_empty() {
            warn!(id = %self.id, "loaded comment has no author, rendering placeholder");
            self.created_by = placeholder_author();
        }
        for reply in &mut self.replies {
            reply.normalize_loaded();
        }
    }
}

/// Creation payload handed to the persistence collaborator, which assigns
/// the id and creation timestamp.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    pub content: String,
    pub locator: String,
    pub page_url: String,
    pub anchor: Anchor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_position: Option<Point>,
    pub created_by: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub attachments: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(created_by: &str) -> CommentRecord {
        CommentRecord {
            id: uuid::Uuid::new_v4(),
            content: "needs contrast".to_owned(),
            locator: "//*[@id=\"hero\"]".to_owned(),
            page_url: "https://example.test/".to_owned(),
            anchor: Anchor::new(0.5, 0.5),
            absolute_position: None,
            created_at: 1_700_000_000_000,
            created_by: created_by.to_owned(),
            role: "reviewer".to_owned(),
            status: CommentStatus::New,
            resolved_at: None,
            archived_at: None,
            replies: Vec::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn status_serializes_kebab_case_and_accepts_bug_alias() {
        let json = serde_json::to_string(&CommentStatus::FeatureRequest).unwrap();
        assert_eq!(json, "\"feature-request\"");

        let legacy: CommentStatus = serde_json::from_str("\"bug\"").unwrap();
        assert_eq!(legacy, CommentStatus::New);

        let done: CommentStatus = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(done, CommentStatus::Done);
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(record("dana")).unwrap();
        assert!(json.get("pageUrl").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("createdBy").is_some());
        // Advisory snapshot is omitted when absent.
        assert!(json.get("absolutePosition").is_none());
    }

    #[test]
    fn minimal_stored_record_still_deserializes() {
        let json = r#"{
            "id": "7f4df1f2-4e3b-4c3a-9b57-9a8f6a1f0d11",
            "content": "old schema",
            "locator": "/html/body/div",
            "pageUrl": "https://example.test/",
            "anchor": { "fx": 0.25, "fy": 0.75 },
            "createdAt": 1700000000000
        }"#;

        let parsed: CommentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, CommentStatus::New);
        assert!(parsed.replies.is_empty());
        assert!(parsed.created_by.is_empty());
    }

    #[test]
    fn normalize_fills_missing_authors_recursively() {
        let mut parent = record("");
        parent.replies.push(record("   "));
        parent.replies.push(record("lee"));

        parent.normalize_loaded();

        assert_eq!(parent.created_by, "Unknown");
        assert_eq!(parent.replies[0].created_by, "Unknown");
        assert_eq!(parent.replies[1].created_by, "lee");
    }
}
