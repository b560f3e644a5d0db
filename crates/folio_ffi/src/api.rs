//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose editor sessions and content reads to Dart via FRB.
//! - Keep sessions alive between calls in a process-wide registry.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every editor call returns an envelope; failures set `ok=false` and a
//!   human-readable `message`.
//! - Timestamps cross the boundary as Unix epoch milliseconds.

use folio_core::db::open_db;
use folio_core::{
    core_version as core_version_inner, generate_slug as generate_slug_inner,
    init_logging as init_logging_inner, ping as ping_inner, BlockType, ContentService,
    DocumentCategory, DocumentRecord, DocumentStatus, EditorConfig, EditorError, EditorSession,
    MemoryLocalStore, SqliteDocumentRepository, SqliteLocalStore,
};
use log::{info, warn};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

const EDITOR_DB_FILE_NAME: &str = "folio_editor.sqlite3";
const DB_PATH_ENV: &str = "FOLIO_DB_PATH";

type Session = EditorSession<SqliteLocalStore>;

static EDITOR_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static SESSIONS: OnceLock<Mutex<BTreeMap<u64, Session>>> = OnceLock::new();
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// URL slug for a title, as the document store would derive it.
#[flutter_rust_bridge::frb(sync)]
pub fn generate_slug(title: String) -> String {
    generate_slug_inner(&title)
}

/// Editor view returned after every editor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub title: String,
    pub slug: String,
    /// `work|log|guide`.
    pub category: String,
    /// `draft|published|archived`.
    pub status: String,
    pub index_log: String,
    /// Body blocks as stored JSON.
    pub blocks_json: String,
    /// Cover URL with framing fragment when non-default.
    pub cover_photo: String,
    pub can_undo: bool,
    pub can_redo: bool,
    /// A local draft is waiting for accept/discard.
    pub has_pending_draft: bool,
    pub cover_repaired: bool,
    pub word_count: u32,
    pub reading_time_minutes: u32,
    pub last_autosave_at: Option<i64>,
}

/// Response envelope for editor calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorResponse {
    pub ok: bool,
    pub session_id: Option<u64>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    pub state: Option<EditorState>,
}

impl EditorResponse {
    fn success(session_id: u64, message: impl Into<String>, session: &Session) -> Self {
        Self {
            ok: true,
            session_id: Some(session_id),
            message: message.into(),
            state: Some(build_editor_state(session)),
        }
    }

    fn failure(session_id: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            session_id,
            message: message.into(),
            state: None,
        }
    }
}

/// One listed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub cover_photo: String,
    pub tags: Vec<String>,
    pub status: String,
    pub created_at: i64,
}

/// Response envelope for content listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentListResponse {
    pub ok: bool,
    pub items: Vec<DocumentSummary>,
    pub message: String,
}

/// Starts a session on an empty document of `category`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics.
/// - `state.has_pending_draft` tells the UI to offer recovery.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_new(category: String, now_ms: i64) -> EditorResponse {
    let Some(category) = DocumentCategory::parse(&category) else {
        return EditorResponse::failure(None, format!("unknown category `{category}`"));
    };
    let store = match open_local_store() {
        Ok(store) => store,
        Err(message) => return EditorResponse::failure(None, message),
    };
    match EditorSession::new_document(category, store, EditorConfig::default(), now_ms) {
        Ok(session) => register_session(session, "Session started."),
        Err(err) => EditorResponse::failure(None, format!("editor_new failed: {err}")),
    }
}

/// Starts a session on the stored document `slug`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(slug: String, now_ms: i64) -> EditorResponse {
    let store = match open_local_store() {
        Ok(store) => store,
        Err(message) => return EditorResponse::failure(None, message),
    };
    let opened = with_repo(|repo| {
        EditorSession::open(repo, slug.trim(), store, EditorConfig::default(), now_ms)
            .map_err(|err| format!("editor_open failed: {err}"))
    });
    match opened {
        Ok(Some(session)) => register_session(session, "Document opened."),
        Ok(None) => EditorResponse::failure(None, format!("document `{}` not found", slug.trim())),
        Err(message) => EditorResponse::failure(None, message),
    }
}

/// Current state of a session.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_state(session_id: u64) -> EditorResponse {
    with_session(session_id, |_| Ok("OK".to_string()))
}

/// Inserts a block of `block_type` at `at` (clamped).
#[flutter_rust_bridge::frb(sync)]
pub fn editor_insert_block(session_id: u64, block_type: String, at: u32) -> EditorResponse {
    with_session(session_id, |session| {
        let kind = parse_block_type(&block_type)?;
        let index = session
            .insert_block(kind, at as usize)
            .map_err(editor_message)?;
        Ok(format!("Inserted `{}` at {index}.", kind.as_str()))
    })
}

/// Stores typed text; markdown shortcuts apply to paragraphs.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_update_block(session_id: u64, index: u32, text: String, now_ms: i64) -> EditorResponse {
    with_session(session_id, |session| {
        session
            .update_block_content(index as usize, &text, now_ms)
            .map_err(editor_message)?;
        Ok("Updated.".to_string())
    })
}

/// Removes the block at `index`; out of range is reported, not an error.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_remove_block(session_id: u64, index: u32) -> EditorResponse {
    with_session(session_id, |session| {
        let removed = session
            .remove_block(index as usize)
            .map_err(editor_message)?;
        Ok(match removed {
            Some(_) => "Removed.".to_string(),
            None => "Nothing to remove.".to_string(),
        })
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_move_block(session_id: u64, from: u32, to: u32) -> EditorResponse {
    with_session(session_id, |session| {
        session
            .move_block(from as usize, to as usize)
            .map_err(editor_message)?;
        Ok("Moved.".to_string())
    })
}

/// Slash command: re-types the block at `index`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_convert_block(session_id: u64, index: u32, block_type: String) -> EditorResponse {
    with_session(session_id, |session| {
        let kind = parse_block_type(&block_type)?;
        session
            .convert_block(index as usize, kind)
            .map_err(editor_message)?;
        Ok(format!("Converted to `{}`.", kind.as_str()))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_title(session_id: u64, title: String) -> EditorResponse {
    with_session(session_id, |session| {
        session.set_title(&title).map_err(editor_message)?;
        Ok("Title set.".to_string())
    })
}

/// Replaces tags from comma-separated input.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_tags(session_id: u64, input: String) -> EditorResponse {
    with_session(session_id, |session| {
        session.set_tags_input(&input).map_err(editor_message)?;
        Ok("Tags set.".to_string())
    })
}

/// Sets publication status (`draft|published|archived`).
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_status(session_id: u64, status: String) -> EditorResponse {
    with_session(session_id, |session| {
        let status = DocumentStatus::parse(&status)
            .ok_or_else(|| format!("unknown status `{status}`"))?;
        session.set_status(status).map_err(editor_message)?;
        Ok("Status set.".to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_undo(session_id: u64) -> EditorResponse {
    with_session(session_id, |session| {
        let moved = session.undo().map_err(editor_message)?;
        Ok(if moved { "Undone." } else { "Nothing to undo." }.to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_redo(session_id: u64) -> EditorResponse {
    with_session(session_id, |session| {
        let moved = session.redo().map_err(editor_message)?;
        Ok(if moved { "Redone." } else { "Nothing to redo." }.to_string())
    })
}

/// Drives typing debounce and autosave. Call periodically from the UI.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_tick(session_id: u64, now_ms: i64) -> EditorResponse {
    with_session(session_id, |session| {
        let report = session.tick(now_ms).map_err(editor_message)?;
        Ok(format!(
            "snapshot_taken={} autosaved={}",
            report.snapshot_taken, report.autosaved
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_accept_draft(session_id: u64) -> EditorResponse {
    with_session(session_id, |session| {
        let applied = session.accept_draft().map_err(editor_message)?;
        Ok(if applied {
            "Draft recovered."
        } else {
            "No pending draft."
        }
        .to_string())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn editor_discard_draft(session_id: u64) -> EditorResponse {
    with_session(session_id, |session| {
        session.discard_draft().map_err(editor_message)?;
        Ok("Draft discarded.".to_string())
    })
}

/// Saves to the document store.
///
/// # FFI contract
/// - On failure the local draft is kept and `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_save(session_id: u64, now_ms: i64) -> EditorResponse {
    with_session(session_id, |session| {
        with_repo(|repo| {
            let outcome = session.save(repo, now_ms).map_err(editor_message)?;
            Ok(match outcome.status {
                DocumentStatus::Published => format!("ON LIVE! /{}", outcome.slug),
                _ => format!("DRAFT /{}", outcome.slug),
            })
        })
    })
}

/// Writes the preview record read by the `preview` slug.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_preview(session_id: u64, now_ms: i64) -> EditorResponse {
    with_session(session_id, |session| {
        with_repo(|repo| {
            session.preview(repo, now_ms).map_err(editor_message)?;
            Ok("Preview ready.".to_string())
        })
    })
}

/// Stops the session timers and drops the session.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_close(session_id: u64) -> EditorResponse {
    let Ok(mut sessions) = sessions().lock() else {
        return EditorResponse::failure(Some(session_id), "session registry unavailable");
    };
    match sessions.remove(&session_id) {
        Some(mut session) => {
            session.close();
            info!("event=ffi_session_close module=ffi status=ok session_id={session_id}");
            EditorResponse::success(session_id, "Session closed.", &session)
        }
        None => EditorResponse::failure(Some(session_id), "unknown session"),
    }
}

/// Lists documents of `category`, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn content_list(category: String) -> DocumentListResponse {
    let Some(category) = DocumentCategory::parse(&category) else {
        return DocumentListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("unknown category `{category}`"),
        };
    };
    let listed = with_repo(|repo| {
        ContentService::new(repo, MemoryLocalStore::new())
            .list(category)
            .map_err(|err| format!("content_list failed: {err}"))
    });
    match listed {
        Ok(records) => DocumentListResponse {
            ok: true,
            message: format!("Found {} document(s).", records.len()),
            items: records.into_iter().map(to_document_summary).collect(),
        },
        Err(message) => DocumentListResponse {
            ok: false,
            items: Vec::new(),
            message,
        },
    }
}

fn resolve_db_path() -> PathBuf {
    EDITOR_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(EDITOR_DB_FILE_NAME)
        })
        .clone()
}

fn sessions() -> &'static Mutex<BTreeMap<u64, Session>> {
    SESSIONS.get_or_init(|| Mutex::new(BTreeMap::new()))
}

fn open_local_store() -> Result<SqliteLocalStore, String> {
    SqliteLocalStore::open(resolve_db_path())
        .map_err(|err| format!("local store open failed: {err}"))
}

fn with_repo<T>(
    f: impl FnOnce(&SqliteDocumentRepository<'_>) -> Result<T, String>,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| format!("editor DB open failed: {err}"))?;
    let repo = SqliteDocumentRepository::try_new(&conn)
        .map_err(|err| format!("document repo init failed: {err}"))?;
    f(&repo)
}

fn register_session(session: Session, message: &str) -> EditorResponse {
    let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    let response = EditorResponse::success(session_id, message, &session);
    match sessions().lock() {
        Ok(mut registry) => {
            registry.insert(session_id, session);
            info!("event=ffi_session_open module=ffi status=ok session_id={session_id}");
            response
        }
        Err(_) => EditorResponse::failure(None, "session registry unavailable"),
    }
}

fn with_session(
    session_id: u64,
    f: impl FnOnce(&mut Session) -> Result<String, String>,
) -> EditorResponse {
    let Ok(mut registry) = sessions().lock() else {
        return EditorResponse::failure(Some(session_id), "session registry unavailable");
    };
    let Some(session) = registry.get_mut(&session_id) else {
        return EditorResponse::failure(Some(session_id), "unknown session");
    };
    match f(session) {
        Ok(message) => EditorResponse::success(session_id, message, session),
        Err(message) => {
            warn!("event=ffi_editor_call module=ffi status=error session_id={session_id}");
            EditorResponse {
                state: Some(build_editor_state(session)),
                ..EditorResponse::failure(Some(session_id), message)
            }
        }
    }
}

fn editor_message(err: EditorError) -> String {
    err.to_string()
}

fn parse_block_type(raw: &str) -> Result<BlockType, String> {
    BlockType::parse(raw).ok_or_else(|| format!("unknown block type `{raw}`"))
}

fn build_editor_state(session: &Session) -> EditorState {
    let draft = session.draft();
    EditorState {
        title: draft.title.clone(),
        slug: draft.slug.clone(),
        category: draft.category.as_str().to_string(),
        status: draft.status.as_str().to_string(),
        index_log: draft.index_log.clone(),
        blocks_json: serde_json::to_string(&draft.blocks).unwrap_or_else(|_| "[]".to_string()),
        cover_photo: draft.cover.encode(),
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
        has_pending_draft: session.pending_draft().is_some(),
        cover_repaired: session.cover_repaired(),
        word_count: u32::try_from(session.word_count()).unwrap_or(u32::MAX),
        reading_time_minutes: u32::try_from(session.reading_time_minutes()).unwrap_or(u32::MAX),
        last_autosave_at: session.last_autosave_at(),
    }
}

fn to_document_summary(record: DocumentRecord) -> DocumentSummary {
    DocumentSummary {
        id: record.id,
        slug: record.slug,
        title: record.title,
        cover_photo: record.cover_photo,
        tags: record.tags,
        status: record.status.as_str().to_string(),
        created_at: record.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        content_list, core_version, editor_close, editor_insert_block, editor_new, editor_redo,
        editor_save, editor_set_title, editor_undo, editor_update_block, generate_slug,
        init_logging, ping,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn generate_slug_strips_accents() {
        assert_eq!(generate_slug("Café Project – 2024!".to_string()), "cafe-project-2024");
    }

    #[test]
    fn editor_new_rejects_unknown_category() {
        let response = editor_new("poem".to_string(), 0);
        assert!(!response.ok);
        assert!(response.session_id.is_none());
    }

    #[test]
    fn unknown_session_is_reported() {
        let response = editor_undo(u64::MAX);
        assert!(!response.ok);
        assert_eq!(response.message, "unknown session");
    }

    #[test]
    fn editor_flow_saves_and_lists_document() {
        let title = unique_token("FFI Log");
        let opened = editor_new("log".to_string(), 0);
        assert!(opened.ok, "{}", opened.message);
        let id = opened.session_id.expect("session id");

        assert!(editor_set_title(id, title.clone()).ok);
        assert!(editor_insert_block(id, "h1".to_string(), 0).ok);
        let typed = editor_update_block(id, 0, "Intro".to_string(), 10);
        assert_eq!(typed.state.expect("state").index_log, "01_INTRO");

        let undone = editor_undo(id);
        assert!(undone.ok);
        assert!(undone.state.expect("state").can_redo);
        assert!(editor_redo(id).ok);

        let saved = editor_save(id, 20);
        assert!(saved.ok, "{}", saved.message);
        let state = saved.state.expect("state");
        assert_eq!(state.slug, generate_slug(title));
        assert!(saved.message.starts_with("DRAFT /"));

        let listed = content_list("log".to_string());
        assert!(listed.ok, "{}", listed.message);
        assert!(listed.items.iter().any(|item| item.slug == state.slug));

        assert!(editor_close(id).ok);
        assert!(!editor_set_title(id, "late".to_string()).ok);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix} {nanos}")
    }
}
