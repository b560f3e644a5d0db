//! Read-side content service.
//!
//! # Responsibility
//! - Serve category listings and single documents to site callers.
//! - Resolve the reserved `preview` slug from the local preview record.
//!
//! # Invariants
//! - The preview record never reaches the document store.
//! - A broken preview record reads as absent.

use crate::editor::autosave::{load_preview, PREVIEW_SLUG};
use crate::model::document::{DocumentCategory, DocumentInput, DocumentRecord};
use crate::repo::document_repo::{DocumentListQuery, DocumentRepository, RepoResult};
use crate::repo::local_store::LocalStore;
use log::warn;

/// Content facade over a document repository and the local store.
pub struct ContentService<R: DocumentRepository, S: LocalStore> {
    repo: R,
    local: S,
}

impl<R: DocumentRepository, S: LocalStore> ContentService<R, S> {
    pub fn new(repo: R, local: S) -> Self {
        Self { repo, local }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn local(&self) -> &S {
        &self.local
    }

    /// Documents of one category, newest first.
    pub fn list(&self, category: DocumentCategory) -> RepoResult<Vec<DocumentRecord>> {
        self.repo
            .list_documents(&DocumentListQuery::category(category))
    }

    pub fn works(&self) -> RepoResult<Vec<DocumentRecord>> {
        self.list(DocumentCategory::Work)
    }

    pub fn logs(&self) -> RepoResult<Vec<DocumentRecord>> {
        self.list(DocumentCategory::Log)
    }

    pub fn guides(&self) -> RepoResult<Vec<DocumentRecord>> {
        self.list(DocumentCategory::Guide)
    }

    /// One document by slug; `preview` reads the local preview record.
    ///
    /// A broken preview record is deleted on read.
    pub fn get_document(&mut self, slug: &str) -> RepoResult<Option<DocumentRecord>> {
        if slug == PREVIEW_SLUG {
            return Ok(load_preview(&mut self.local).unwrap_or_else(|err| {
                warn!("event=preview_load module=service status=error error={err}");
                None
            }));
        }
        self.repo.get_document(slug)
    }

    pub fn save_document(&self, input: &DocumentInput) -> RepoResult<String> {
        self.repo.save_document(input)
    }

    pub fn delete_document(&self, id: &str) -> RepoResult<()> {
        self.repo.delete_document(id)
    }
}
