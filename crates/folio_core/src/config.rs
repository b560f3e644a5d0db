//! Editor tuning knobs.
//!
//! Hosts usually rely on the defaults; a JSON object with any subset of the
//! fields can override them.

use crate::editor::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_TYPING_DEBOUNCE_MS: u64 = 1_000;

/// Session timing and history configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Period of the local autosave.
    pub autosave_interval_ms: u64,
    /// Quiet time after the last keystroke before a history snapshot.
    pub typing_debounce_ms: u64,
    /// Retained history snapshots.
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            typing_debounce_ms: DEFAULT_TYPING_DEBOUNCE_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EditorConfig {
    /// Parses a JSON override; missing fields keep their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
