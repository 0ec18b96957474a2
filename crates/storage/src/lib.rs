//! Local JSON persistence backend
//!
//! Stores the whole comment set as one pretty-printed JSON document with a
//! `lastUpdated` stamp. Every mutating call rewrites the document atomically
//! (write to a sibling temp file, then rename) so a crash mid-write never
//! leaves a truncated file behind. A missing document reads as an empty set.

use directories::ProjectDirs;
use overmark_core::{now_ms, CommentDraft, CommentId, CommentRecord, CommentStatus, CommentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const COMMENTS_FILE: &str = "comments.json";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
}

/// On-disk document layout. Field names serialize camelCase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsDocument {
    #[serde(default)]
    comments: Vec<CommentRecord>,
    /// Epoch milliseconds of the last rewrite.
    #[serde(default)]
    last_updated: i64,
}

/// File-backed [`CommentStore`] rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Store under the platform's per-user data directory.
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs = ProjectDirs::from("dev", "Overmark", "Overmark")
            .ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn comments_path(&self) -> PathBuf {
        self.root.join(COMMENTS_FILE)
    }

    fn read_document(&self) -> Result<CommentsDocument, StoreError> {
        let path = self.comments_path();
        if !path.exists() {
            return Ok(CommentsDocument::default());
        }

        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_document(&self, mut document: CommentsDocument) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        document.last_updated = now_ms();

        let bytes = serde_json::to_vec_pretty(&document)?;
        let path = self.comments_path();
        let temp = path.with_extension("json.tmp");
        fs::write(&temp, bytes)?;
        fs::rename(&temp, &path)?;

        debug!(count = document.comments.len(), path = %path.display(), "comments document written");
        Ok(())
    }
}

impl CommentStore for JsonStore {
    fn load_comments(&self) -> Result<Vec<CommentRecord>, StoreError> {
        Ok(self.read_document()?.comments)
    }

    fn save_comment(&mut self, draft: CommentDraft) -> Result<CommentRecord, StoreError> {
        let mut document = self.read_document()?;

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

        document.comments.push(record.clone());
        self.write_document(document)?;
        Ok(record)
    }

    fn update_comment(&mut self, record: &CommentRecord) -> Result<(), StoreError> {
        let mut document = self.read_document()?;

        let existing = document
            .comments
            .iter_mut()
            .find(|candidate| candidate.id == record.id)
            .ok_or(StoreError::UnknownComment(record.id))?;
        *existing = record.clone();

        self.write_document(document)
    }

    fn delete_comment(&mut self, id: CommentId) -> Result<(), StoreError> {
        let mut document = self.read_document()?;

        let before = document.comments.len();
        document.comments.retain(|candidate| candidate.id != id);
        if document.comments.len() == before {
            return Err(StoreError::UnknownComment(id));
        }

        self.write_document(document)
    }
}
