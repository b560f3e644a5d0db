//! Domain model for documents and their blocks.
//!
//! # Responsibility
//! - Define the block, cover and document shapes shared by the editor and
//!   the document store.
//! - Keep the stored JSON layout stable.
//!
//! # Invariants
//! - Block payloads are a tagged union keyed by block type.
//! - The body block list is the only ordered sequence the editor mutates.

pub mod block;
pub mod block_list;
pub mod cover;
pub mod document;
