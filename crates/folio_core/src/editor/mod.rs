//! Document editor state machine.
//!
//! # Responsibility
//! - Hold the live editing session for one document.
//! - Keep bounded undo history, local autosave and recovery next to the
//!   edits that produce them.
//!
//! # Invariants
//! - Time only advances through caller-supplied `now` values.
//! - Local persistence never blocks or fails an edit.

pub mod autosave;
pub mod history;
pub mod session;
pub mod timer;
