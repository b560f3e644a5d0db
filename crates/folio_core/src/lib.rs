//! Core domain logic for Folio, the document draft editor.
//! This crate is the single source of truth for editing invariants.

pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod text;

pub use config::EditorConfig;
pub use editor::autosave::{draft_key, PendingDraft, PREVIEW_KEY};
pub use editor::history::HistoryStack;
pub use editor::session::{
    EditorError, EditorResult, EditorSession, SaveOutcome, TextInput, TickReport,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::block::{
    Block, BlockData, BlockId, BlockType, ComparisonColumn, NodeTemplate, ObjectiveItem,
};
pub use model::block_list::BlockList;
pub use model::cover::CoverImage;
pub use model::document::{
    DocumentCategory, DocumentDraft, DocumentId, DocumentInput, DocumentRecord, DocumentStatus,
};
pub use repo::document_repo::{
    AssetBucket, AssetUpload, DocumentListQuery, DocumentRepository, RepoError, RepoResult,
    SqliteDocumentRepository,
};
pub use repo::local_store::{LocalStore, LocalStoreError, MemoryLocalStore, SqliteLocalStore};
pub use service::document_service::ContentService;
pub use text::generate_slug;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
