//! Local draft persistence and recovery.
//!
//! # Responsibility
//! - Serialize the in-progress draft into the local store under a key
//!   derived from the document slug.
//! - Guard recovery against corrupt or oversized records.
//! - Keep the preview record used by the public preview route.
//!
//! # Invariants
//! - Cover references that only live in the current session (`blob:`) or are
//!   inline encoded (`data:`) are never written; they persist as empty.
//! - A stored record containing `"data:image` is deleted without parsing.
//! - An unparsable record is deleted too.

use crate::model::block::Block;
use crate::model::cover::storage_safe;
use crate::model::document::{DocumentDraft, DocumentRecord, DocumentStatus};
use crate::repo::local_store::{LocalStore, LocalStoreError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key prefix for pending drafts.
pub const AUTOSAVE_KEY_PREFIX: &str = "autosave_";
/// Key suffix used while a document has no slug yet.
pub const NEW_DOCUMENT_KEY: &str = "new";
/// Key of the preview record.
pub const PREVIEW_KEY: &str = "portfolio_preview";
/// Slug the public routes use to read the preview record.
pub const PREVIEW_SLUG: &str = "preview";

const CORRUPT_MARKER: &str = "\"data:image";
const PREVIEW_TITLE: &str = "Preview Title";

pub type AutosaveResult<T> = Result<T, AutosaveError>;

#[derive(Debug)]
pub enum AutosaveError {
    Store(LocalStoreError),
    Encode(serde_json::Error),
}

impl Display for AutosaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "cannot encode local record: {err}"),
        }
    }
}

impl Error for AutosaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<LocalStoreError> for AutosaveError {
    fn from(value: LocalStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<serde_json::Error> for AutosaveError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Locally persisted in-progress draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(rename = "coverPhoto", default)]
    pub cover_photo: String,
    #[serde(default)]
    pub status: DocumentStatus,
    /// Unix epoch milliseconds of the write.
    #[serde(default)]
    pub timestamp: i64,
}

impl PendingDraft {
    /// Captures the recoverable part of `draft` with a storage-safe cover.
    pub fn capture(draft: &DocumentDraft, now: i64) -> Self {
        Self {
            title: draft.title.clone(),
            blocks: draft.blocks.as_slice().to_vec(),
            cover_photo: storage_safe(&draft.cover.encode()),
            status: draft.status,
            timestamp: now,
        }
    }
}

/// Local key for a document slug; empty slugs map to `autosave_new`.
pub fn draft_key(slug: &str) -> String {
    let slug = slug.trim();
    if slug.is_empty() {
        format!("{AUTOSAVE_KEY_PREFIX}{NEW_DOCUMENT_KEY}")
    } else {
        format!("{AUTOSAVE_KEY_PREFIX}{slug}")
    }
}

/// Whether a raw stored record embeds inline image data.
pub fn is_corrupt(raw: &str) -> bool {
    raw.contains(CORRUPT_MARKER)
}

/// Writes the pending draft for `draft` under `key`.
pub fn write_pending_draft<S: LocalStore + ?Sized>(
    store: &mut S,
    key: &str,
    draft: &DocumentDraft,
    now: i64,
) -> AutosaveResult<()> {
    let record = PendingDraft::capture(draft, now);
    let encoded = serde_json::to_string(&record)?;
    store.set(key, &encoded)?;
    Ok(())
}

/// Reads the pending draft under `key`.
///
/// Corrupt or unparsable records are deleted and reported as absent.
pub fn load_pending_draft<S: LocalStore + ?Sized>(
    store: &mut S,
    key: &str,
) -> AutosaveResult<Option<PendingDraft>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    if is_corrupt(&raw) {
        warn!(
            "event=draft_recover module=autosave status=discarded reason=inline_image key={} bytes={}",
            key,
            raw.len()
        );
        store.remove(key)?;
        return Ok(None);
    }

    match serde_json::from_str::<PendingDraft>(&raw) {
        Ok(draft) => Ok(Some(draft)),
        Err(err) => {
            warn!(
                "event=draft_recover module=autosave status=discarded reason=unparsable key={} error={}",
                key, err
            );
            store.remove(key)?;
            Ok(None)
        }
    }
}

/// Deletes the pending draft under `key`.
pub fn clear_pending_draft<S: LocalStore + ?Sized>(store: &mut S, key: &str) -> AutosaveResult<()> {
    store.remove(key)?;
    Ok(())
}

/// Builds the preview record for a formatted draft.
pub fn preview_record(draft: &DocumentDraft, now: i64) -> DocumentRecord {
    let title = if draft.title.is_empty() {
        PREVIEW_TITLE.to_string()
    } else {
        draft.title.clone()
    };
    DocumentRecord {
        id: PREVIEW_SLUG.to_string(),
        slug: PREVIEW_SLUG.to_string(),
        title,
        cover_photo: draft.cover.encode(),
        category: draft.category,
        tags: draft.tags.clone(),
        index_log: draft.index_log.clone(),
        blocks: draft.merged_blocks(),
        status: draft.status,
        created_at: now,
        updated_at: now,
    }
}

pub fn write_preview<S: LocalStore + ?Sized>(
    store: &mut S,
    record: &DocumentRecord,
) -> AutosaveResult<()> {
    let encoded = serde_json::to_string(record)?;
    store.set(PREVIEW_KEY, &encoded)?;
    Ok(())
}

/// Reads the preview record with the same corrupt-payload guard as drafts.
///
/// Corrupt or unparsable records are deleted and reported as absent.
pub fn load_preview<S: LocalStore + ?Sized>(
    store: &mut S,
) -> AutosaveResult<Option<DocumentRecord>> {
    let Some(raw) = store.get(PREVIEW_KEY)? else {
        return Ok(None);
    };
    if is_corrupt(&raw) {
        warn!(
            "event=preview_load module=autosave status=discarded reason=inline_image bytes={}",
            raw.len()
        );
        store.remove(PREVIEW_KEY)?;
        return Ok(None);
    }
    match serde_json::from_str::<DocumentRecord>(&raw) {
        Ok(record) => Ok(Some(record)),
        Err(err) => {
            warn!(
                "event=preview_load module=autosave status=discarded reason=unparsable error={}",
                err
            );
            store.remove(PREVIEW_KEY)?;
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{draft_key, is_corrupt, PendingDraft};
    use crate::model::cover::CoverImage;
    use crate::model::document::{DocumentCategory, DocumentDraft};

    #[test]
    fn draft_key_falls_back_to_new() {
        assert_eq!(draft_key(""), "autosave_new");
        assert_eq!(draft_key("  "), "autosave_new");
        assert_eq!(draft_key("my-log"), "autosave_my-log");
    }

    #[test]
    fn capture_drops_session_local_cover() {
        let mut draft = DocumentDraft::new(DocumentCategory::Log);
        draft.title = "T".to_string();
        draft.cover = CoverImage::from_url("blob:session/abc/cover.png");
        let pending = PendingDraft::capture(&draft, 7);
        assert_eq!(pending.cover_photo, "");
        assert_eq!(pending.timestamp, 7);

        draft.cover = CoverImage::from_url("https://cdn.example/c.png");
        assert_eq!(
            PendingDraft::capture(&draft, 7).cover_photo,
            "https://cdn.example/c.png"
        );
    }

    #[test]
    fn pending_draft_uses_camel_case_cover_field() {
        let json = serde_json::to_value(PendingDraft {
            title: "t".to_string(),
            blocks: Vec::new(),
            cover_photo: "u".to_string(),
            status: Default::default(),
            timestamp: 1,
        })
        .unwrap();
        assert_eq!(json["coverPhoto"], "u");
        assert_eq!(json["status"], "draft");
    }

    #[test]
    fn inline_image_marker_is_corrupt() {
        assert!(is_corrupt(r#"{"coverPhoto":"data:image/png;base64,AAA"}"#));
        assert!(!is_corrupt(r#"{"coverPhoto":"https://x/data:image"}"#));
    }
}
