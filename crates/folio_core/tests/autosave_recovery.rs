use folio_core::db::open_db_in_memory;
use folio_core::{
    draft_key, AssetUpload, Block, BlockType, DocumentCategory, DocumentInput,
    DocumentRepository, DocumentStatus, EditorConfig, EditorSession, LocalStore,
    MemoryLocalStore, PendingDraft, SqliteDocumentRepository, SqliteLocalStore,
};

const AUTOSAVE_MS: i64 = 10_000;

fn new_session(store: MemoryLocalStore) -> EditorSession<MemoryLocalStore> {
    EditorSession::new_document(DocumentCategory::Log, store, EditorConfig::default(), 0)
        .unwrap()
}

fn stored_draft(store: &impl LocalStore, key: &str) -> PendingDraft {
    let raw = store.get(key).unwrap().expect("draft should be stored");
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn empty_document_is_never_autosaved() {
    let mut session = new_session(MemoryLocalStore::new());
    let report = session.tick(AUTOSAVE_MS).unwrap();
    assert!(!report.autosaved);
    assert!(session.store().is_empty());
}

#[test]
fn interval_writes_the_draft_under_the_new_key() {
    let mut session = new_session(MemoryLocalStore::new());
    session.set_title("Night notes").unwrap();
    session.push_block(BlockType::Paragraph).unwrap();

    assert!(!session.tick(AUTOSAVE_MS - 1).unwrap().autosaved);
    assert!(session.tick(AUTOSAVE_MS).unwrap().autosaved);
    assert_eq!(session.last_autosave_at(), Some(AUTOSAVE_MS));

    let draft = stored_draft(session.store(), "autosave_new");
    assert_eq!(draft.title, "Night notes");
    assert_eq!(draft.blocks.len(), 1);
    assert_eq!(draft.status, DocumentStatus::Draft);
    assert_eq!(draft.timestamp, AUTOSAVE_MS);
}

#[test]
fn session_local_and_inline_covers_are_not_persisted() {
    let mut session = new_session(MemoryLocalStore::new());
    session.set_title("Covered").unwrap();

    let reference = session
        .stage_cover_upload(AssetUpload::new("hero.png", "image/png", vec![7; 16]), 5)
        .unwrap();
    assert!(reference.starts_with("blob:"));
    assert_eq!(session.draft().cover.url, reference);
    assert_eq!(stored_draft(session.store(), "autosave_new").cover_photo, "");

    session
        .set_cover_url("data:image/png;base64,iVBORw0KGgo=")
        .unwrap();
    session.autosave_now(6);
    let raw = session.store().get("autosave_new").unwrap().unwrap();
    assert!(!raw.contains("data:image"));
    assert!(session.draft().cover.url.starts_with("data:"));
}

#[test]
fn corrupt_draft_is_deleted_on_entry() {
    let mut store = MemoryLocalStore::new();
    store
        .set(
            "autosave_new",
            r#"{"title":"x","blocks":[],"coverPhoto":"data:image/png;base64,AAAA","timestamp":1}"#,
        )
        .unwrap();

    let session = new_session(store);
    assert!(session.pending_draft().is_none());
    assert!(!session.store().contains_key("autosave_new"));
}

#[test]
fn unparsable_draft_is_deleted_on_entry() {
    let mut store = MemoryLocalStore::new();
    store.set("autosave_new", "{ not json").unwrap();

    let session = new_session(store);
    assert!(session.pending_draft().is_none());
    assert!(!session.store().contains_key("autosave_new"));
}

#[test]
fn pending_draft_can_be_accepted() {
    let mut store = MemoryLocalStore::new();
    let pending = PendingDraft {
        title: "Recovered".to_string(),
        blocks: vec![
            Block::with_content(BlockType::Heading1, "Lost section"),
            Block::with_content(BlockType::Paragraph, "words"),
        ],
        cover_photo: "https://cdn.example/c.png#x=10&y=90&s=150".to_string(),
        status: DocumentStatus::Published,
        timestamp: 1,
    };
    store
        .set("autosave_new", &serde_json::to_string(&pending).unwrap())
        .unwrap();

    let mut session = new_session(store);
    assert_eq!(session.pending_draft(), Some(&pending));
    let before = session.history_len();

    assert!(session.accept_draft().unwrap());
    assert!(session.pending_draft().is_none());
    assert_eq!(session.draft().title, "Recovered");
    assert_eq!(session.blocks().len(), 2);
    assert_eq!(session.draft().status, DocumentStatus::Published);
    assert_eq!(session.draft().cover.url, "https://cdn.example/c.png");
    assert_eq!(session.draft().cover.pos_y, 90);
    assert_eq!(session.index_log(), "01_LOST_SECTION");
    assert_eq!(session.history_len(), before + 1);
    assert!(!session.accept_draft().unwrap());
}

#[test]
fn accepting_keeps_current_cover_when_recovered_cover_is_empty() {
    let mut store = MemoryLocalStore::new();
    store
        .set(
            "autosave_new",
            r#"{"title":"t","blocks":[],"coverPhoto":"","timestamp":3}"#,
        )
        .unwrap();
    let mut session = new_session(store);
    session.set_cover_url("https://cdn.example/keep.png").unwrap();

    session.accept_draft().unwrap();
    assert_eq!(session.draft().cover.url, "https://cdn.example/keep.png");
    assert_eq!(session.draft().status, DocumentStatus::Draft);
}

#[test]
fn discarding_removes_the_record() {
    let mut store = MemoryLocalStore::new();
    store
        .set("autosave_new", r#"{"title":"t","blocks":[],"timestamp":3}"#)
        .unwrap();
    let mut session = new_session(store);
    assert!(session.pending_draft().is_some());

    session.discard_draft().unwrap();
    assert!(session.pending_draft().is_none());
    assert!(!session.store().contains_key("autosave_new"));
}

#[test]
fn quota_failure_is_logged_and_editing_continues() {
    let mut session = new_session(MemoryLocalStore::with_quota(8));
    session.set_title("A title long enough to overflow").unwrap();

    assert!(!session.tick(AUTOSAVE_MS).unwrap().autosaved);
    assert!(session.last_autosave_at().is_none());
    session.push_block(BlockType::Paragraph).unwrap();
    assert_eq!(session.blocks().len(), 1);
}

#[test]
fn existing_document_recovers_from_its_slug_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let slug = repo
        .save_document(&DocumentInput {
            id: None,
            slug: "field-notes".to_string(),
            title: "Field notes".to_string(),
            cover_photo: String::new(),
            category: DocumentCategory::Guide,
            tags: Vec::new(),
            index_log: String::new(),
            blocks: Vec::new(),
            status: DocumentStatus::Published,
        })
        .unwrap();

    let mut store = SqliteLocalStore::open_in_memory().unwrap();
    store
        .set(
            &draft_key(&slug),
            r#"{"title":"Field notes v2","blocks":[],"timestamp":9}"#,
        )
        .unwrap();

    let session = EditorSession::open(&repo, &slug, store, EditorConfig::default(), 0)
        .unwrap()
        .unwrap();
    assert_eq!(session.autosave_key(), "autosave_field-notes");
    assert_eq!(
        session.pending_draft().map(|d| d.title.as_str()),
        Some("Field notes v2")
    );
}
