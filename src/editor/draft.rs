//! Local snapshots of in-progress post edits.
//!
//! A draft is a recovery aid only: the API stays the source of truth, and a
//! draft that cannot be read is ignored rather than reported as an error.
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::form::{PostForm, TagSelection};
use crate::model::TagType;

/// Drafts larger than this are treated as corrupt.
const MAX_DRAFT_SIZE: u64 = 5 * 1024 * 1024;

/// Which form a draft belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKey {
    /// The "add post" form.
    New,
    /// The edit form of an existing post.
    Post(i64),
}

impl DraftKey {
    fn file_name(self) -> String {
        match self {
            DraftKey::New => "new.json".to_string(),
            DraftKey::Post(id) => format!("post-{id}.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tag_option_ids: Vec<i64>,
    /// Unix seconds.
    pub saved_at: i64,
}

impl Draft {
    /// Snapshot of the form as it is now.
    pub fn from_form(form: &PostForm) -> Self {
        Self {
            title: form.title.clone(),
            content: form.content.clone(),
            category_id: form.category_id,
            tag_option_ids: form.selection.option_ids(),
            saved_at: Utc::now().timestamp(),
        }
    }

    /// Restores the form, re-deriving the tag selection from the current tag types.
    pub fn into_form(self, tag_types: &[TagType]) -> PostForm {
        PostForm {
            selection: TagSelection::from_option_ids(tag_types, self.tag_option_ids),
            title: self.title,
            content: self.content,
            category_id: self.category_id,
        }
    }
}

/// Directory of draft files, one JSON file per [`DraftKey`].
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: DraftKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Writes the draft atomically (temp file, fsync, rename) so a crash
    /// mid-write never leaves a half-written snapshot behind.
    pub fn save(&self, key: DraftKey, draft: &Draft) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let body = serde_json::to_vec_pretty(draft)?;
        atomic_write(&path, &body)?;
        tracing::debug!(path = %path.display(), bytes = body.len(), "Saved draft");
        Ok(path)
    }

    /// Best-effort read: a missing, oversized, unreadable or malformed draft yields `None`.
    pub fn load(&self, key: DraftKey) -> Option<Draft> {
        let path = self.path_for(key);

        match std::fs::metadata(&path) {
            Ok(meta) if meta.len() > MAX_DRAFT_SIZE => {
                tracing::warn!(path = %path.display(), bytes = meta.len(), "Draft too large, ignoring");
                return None;
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to stat draft");
                return None;
            }
        }

        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read draft");
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed draft");
                None
            }
        }
    }

    /// Deletes the draft. Deleting a draft that does not exist is not an error.
    pub fn clear(&self, key: DraftKey) -> std::io::Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// [`clear`](Self::clear) for callers that cannot act on a failure: the
    /// error is logged. Returns whether the draft is gone.
    pub fn discard(&self, key: DraftKey) -> bool {
        match self.clear(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.path_for(key).display(),
                    error = %e,
                    "Failed to delete draft"
                );
                false
            }
        }
    }
}

fn atomic_write(dst: &Path, body: &[u8]) -> std::io::Result<()> {
    // Unpredictable temp name, created exclusively, so a pre-placed symlink cannot be followed.
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let tmp = dst.with_extension(format!("tmp.{suffix:016x}"));

    let result = (|| {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp)?;
        file.write_all(body)?;
        file.sync_all()?;
        drop(file);

        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
        std::fs::rename(&tmp, dst)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}
