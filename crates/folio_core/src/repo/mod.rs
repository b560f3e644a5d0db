//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the document store contract the editor saves through.
//! - Define the local key-value contract used for drafts and previews.
//! - Isolate SQLite query details from editor/service orchestration.
//!
//! # Invariants
//! - Repository APIs report absence as `Ok(None)`, not as an error.
//! - Write failures are returned to the caller, never swallowed here.

pub mod document_repo;
pub mod local_store;
