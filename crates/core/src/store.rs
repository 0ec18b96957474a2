//! Persistence collaborator contract
//!
//! The manager never talks to storage directly; it goes through
//! [`CommentStore`], which a backend (local JSON document, remote API, ...)
//! implements. Calls are serialized before any local mutation: a rejection
//! means the corresponding in-memory change is skipped. Updates are
//! last-write-wins with no staleness check.

use crate::comment::{now_ms, CommentDraft, CommentId, CommentRecord, CommentStatus};

/// Failure from a persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unknown comment id: {0}")]
    UnknownComment(CommentId),
    #[error("storage rejected the operation: {0}")]
    Rejected(String),
}

/// Injected persistence backend.
pub trait CommentStore {
    /// The full comment set across all pages; the manager filters by URL.
    fn load_comments(&self) -> Result<Vec<CommentRecord>, StoreError>;

    /// Persist a new comment; the store assigns id and creation timestamp.
    fn save_comment(&mut self, draft: CommentDraft) -> Result<CommentRecord, StoreError>;

    /// Persist an updated record (replies, status changes). Replaces by id.
    fn update_comment(&mut self, record: &CommentRecord) -> Result<(), StoreError>;

    /// Persist a deletion. A rejection aborts the local removal.
    fn delete_comment(&mut self, id: CommentId) -> Result<(), StoreError>;
}

/// In-memory [`CommentStore`], for tests and short-lived embeddings.
#[derive(Debug, Default)]
pub struct MemoryStore {
    comments: Vec<CommentRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with pre-existing records, as if loaded from disk.
    pub fn with_comments(comments: Vec<CommentRecord>) -> Self {
        Self { comments }
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

impl CommentStore for MemoryStore {
    fn load_comments(&self) -> Result<Vec<CommentRecord>, StoreError> {
        Ok(self.comments.clone())
    }

    fn save_comment(&mut self, draft: CommentDraft) -> Result<CommentRecord, StoreError> {
        let record = CommentRecord {
            id: CommentId::new_v4(),
            content: draft.content,
            locator: draft.locator,
            page_url: draft.page_url,
            anchor: draft.anchor,
            absolute_position: draft.absolute_position,
            created_at: now_ms(),
            created_by: draft.created_by,
            role: draft.role,
            status: CommentStatus::New,
            resolved_at: None,
            archived_at: None,
            replies: Vec::new(),
            attachments: draft.attachments,
        };
        self.comments.push(record.clone());
        Ok(record)
    }

    fn update_comment(&mut self, record: &CommentRecord) -> Result<(), StoreError> {
        let existing = self
            .comments
            .iter_mut()
            .find(|candidate| candidate.id == record.id)
            .ok_or(StoreError::UnknownComment(record.id))?;
        *existing = record.clone();
        Ok(())
    }

    fn delete_comment(&mut self, id: CommentId) -> Result<(), StoreError> {
        let before = self.comments.len();
        self.comments.retain(|candidate| candidate.id != id);
        if self.comments.len() == before {
            return Err(StoreError::UnknownComment(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overmark_dom::Anchor;

    fn draft() -> CommentDraft {
        CommentDraft {
            content: "alignment is off".to_owned(),
            locator: "/html/body/div".to_owned(),
            page_url: "https://example.test/".to_owned(),
            anchor: Anchor::new(0.2, 0.25),
            absolute_position: None,
            created_by: "dana".to_owned(),
            role: "reviewer".to_owned(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn save_assigns_id_and_timestamp() {
        let mut store = MemoryStore::new();
        let record = store.save_comment(draft()).unwrap();

        assert!(record.created_at > 0);
        assert_eq!(record.status, CommentStatus::New);
        assert_eq!(store.len(), 1);

        let other = store.save_comment(draft()).unwrap();
        assert_ne!(record.id, other.id);
    }

    #[test]
    fn update_replaces_by_id() {
        let mut store = MemoryStore::new();
        let mut record = store.save_comment(draft()).unwrap();

        record.status = CommentStatus::Done;
        store.update_comment(&record).unwrap();

        let loaded = store.load_comments().unwrap();
        assert_eq!(loaded[0].status, CommentStatus::Done);
    }

    #[test]
    fn update_and_delete_reject_unknown_ids() {
        let mut store = MemoryStore::new();
        let record = store.save_comment(draft()).unwrap();

        let mut ghost = record.clone();
        ghost.id = CommentId::new_v4();
        assert!(matches!(store.update_comment(&ghost), Err(StoreError::UnknownComment(_))));
        assert!(matches!(store.delete_comment(ghost.id), Err(StoreError::UnknownComment(_))));

        store.delete_comment(record.id).unwrap();
        assert!(store.is_empty());
    }
}
