use folio_core::db::open_db_in_memory;
use folio_core::{
    AssetBucket, AssetUpload, Block, BlockType, DocumentCategory, DocumentInput,
    DocumentListQuery, DocumentRepository, DocumentStatus, RepoError, SqliteDocumentRepository,
};
use rusqlite::Connection;

fn input(title: &str, category: DocumentCategory) -> DocumentInput {
    DocumentInput {
        id: None,
        slug: String::new(),
        title: title.to_string(),
        cover_photo: String::new(),
        category,
        tags: vec!["rust".to_string()],
        index_log: String::new(),
        blocks: vec![Block::with_content(BlockType::Paragraph, "hello")],
        status: DocumentStatus::Draft,
    }
}

#[test]
fn insert_derives_slug_and_round_trips_blocks() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let slug = repo
        .save_document(&input("Café Project – 2024!", DocumentCategory::Work))
        .unwrap();
    assert_eq!(slug, "cafe-project-2024");

    let loaded = repo.get_document(&slug).unwrap().unwrap();
    assert_eq!(loaded.title, "Café Project – 2024!");
    assert_eq!(loaded.tags, vec!["rust"]);
    assert_eq!(loaded.blocks.len(), 1);
    assert_eq!(loaded.blocks[0].content, "hello");
    assert_eq!(loaded.status, DocumentStatus::Draft);
    assert!(loaded.created_at > 0);
}

#[test]
fn empty_title_defaults_to_untitled() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let slug = repo.save_document(&input("", DocumentCategory::Log)).unwrap();
    assert_eq!(slug, "untitled");
    assert_eq!(repo.get_document("untitled").unwrap().unwrap().title, "Untitled");
}

#[test]
fn title_without_slug_characters_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let err = repo
        .save_document(&input("!!!", DocumentCategory::Log))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidInput(_)));
}

#[test]
fn save_with_id_overwrites_in_place() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let slug = repo.save_document(&input("First", DocumentCategory::Guide)).unwrap();
    let stored = repo.get_document(&slug).unwrap().unwrap();

    let mut update = input("First, revised", DocumentCategory::Guide);
    update.id = Some(stored.id.clone());
    update.slug = stored.slug.clone();
    update.status = DocumentStatus::Published;
    assert_eq!(repo.save_document(&update).unwrap(), "first");

    let reloaded = repo.get_document("first").unwrap().unwrap();
    assert_eq!(reloaded.id, stored.id);
    assert_eq!(reloaded.title, "First, revised");
    assert_eq!(reloaded.status, DocumentStatus::Published);
    assert_eq!(
        repo.list_documents(&DocumentListQuery::default()).unwrap().len(),
        1
    );
}

#[test]
fn save_with_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let mut ghost = input("Ghost", DocumentCategory::Log);
    ghost.id = Some("missing-id".to_string());
    let err = repo.save_document(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == "missing-id"));
}

#[test]
fn duplicate_slug_surfaces_a_db_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    repo.save_document(&input("Same", DocumentCategory::Log)).unwrap();
    let err = repo
        .save_document(&input("Same", DocumentCategory::Log))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let slug = repo.save_document(&input("Gone", DocumentCategory::Log)).unwrap();
    let id = repo.get_document(&slug).unwrap().unwrap().id;
    repo.delete_document(&id).unwrap();
    repo.delete_document(&id).unwrap();
    assert!(repo.get_document(&slug).unwrap().is_none());
}

#[test]
fn listing_filters_by_category_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    repo.save_document(&input("Old log", DocumentCategory::Log)).unwrap();
    repo.save_document(&input("A work", DocumentCategory::Work)).unwrap();
    repo.save_document(&input("New log", DocumentCategory::Log)).unwrap();

    let logs = repo
        .list_documents(&DocumentListQuery::category(DocumentCategory::Log))
        .unwrap();
    let slugs = logs.iter().map(|d| d.slug.as_str()).collect::<Vec<_>>();
    assert_eq!(slugs, vec!["new-log", "old-log"]);

    let paged = repo
        .list_documents(&DocumentListQuery {
            category: Some(DocumentCategory::Log),
            limit: Some(1),
            offset: 1,
            ..DocumentListQuery::default()
        })
        .unwrap();
    assert_eq!(paged.len(), 1);
    assert_eq!(paged[0].slug, "old-log");
}

#[test]
fn clear_cover_photo_blanks_the_stored_value() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let mut doc = input("Covered", DocumentCategory::Work);
    doc.cover_photo = "data:image/png;base64,AAAA".to_string();
    let slug = repo.save_document(&doc).unwrap();
    let id = repo.get_document(&slug).unwrap().unwrap().id;

    repo.clear_cover_photo(&id).unwrap();
    assert_eq!(repo.get_document(&slug).unwrap().unwrap().cover_photo, "");
    assert!(matches!(
        repo.clear_cover_photo("nope").unwrap_err(),
        RepoError::NotFound(_)
    ));
}

#[test]
fn uploads_return_bucket_scoped_references() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();

    let url = repo
        .upload_asset(
            AssetBucket::Covers,
            &AssetUpload::new("hero shot.png", "image/png", vec![1, 2, 3]),
        )
        .unwrap();
    assert!(url.starts_with("asset://blog_covers/"));
    assert!(url.ends_with("-hero_shot.png"));

    let empty = repo
        .upload_asset(
            AssetBucket::Gallery,
            &AssetUpload::new("empty.png", "image/png", Vec::new()),
        )
        .unwrap_err();
    assert!(matches!(empty, RepoError::InvalidInput(_)));
}

#[test]
fn repository_requires_migrated_schema() {
    let conn = Connection::open_in_memory().unwrap();
    let result = SqliteDocumentRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("documents"))
    ));
}
