//! Document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist document records (create, overwrite in place, delete).
//! - Serve reads by slug and category listings for the public site.
//! - Store uploaded files (covers, gallery images, videos) and hand back
//!   durable references.
//!
//! # Invariants
//! - `save_document` with an id overwrites that row or fails `NotFound`;
//!   without an id it inserts and returns the assigned slug.
//! - Missing slugs are derived with `generate_slug(title or "untitled")`.
//! - `delete_document` is idempotent.
//! - Listings are ordered `created_at DESC`, newest insert first on ties.

use crate::db::{table_exists, DbError};
use crate::model::block::Block;
use crate::model::document::{
    DocumentCategory, DocumentId, DocumentInput, DocumentRecord, DocumentStatus,
};
use crate::text::generate_slug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    id,
    slug,
    title,
    cover_photo,
    category,
    tags,
    index_log,
    blocks,
    status,
    created_at,
    updated_at
FROM documents";

const UNTITLED: &str = "Untitled";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document and asset persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Target document id does not exist.
    NotFound(DocumentId),
    /// Caller payload cannot be persisted.
    InvalidInput(String),
    /// Persisted row cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema lacks a table this repository needs.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::InvalidInput(message) => write!(f, "invalid document input: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "document repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage bucket for uploaded files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBucket {
    Covers,
    Gallery,
    Videos,
}

impl AssetBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Covers => "blog_covers",
            Self::Gallery => "gallery",
            Self::Videos => "videos",
        }
    }
}

/// One file handed to the store for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// Query options for category listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentListQuery {
    pub category: Option<DocumentCategory>,
    pub status: Option<DocumentStatus>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl DocumentListQuery {
    pub fn category(category: DocumentCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }
}

/// Document store contract consumed by the editor and the content service.
pub trait DocumentRepository {
    /// Gets one document by slug; absence is `Ok(None)`.
    fn get_document(&self, slug: &str) -> RepoResult<Option<DocumentRecord>>;
    /// Creates or overwrites a document and returns its slug.
    fn save_document(&self, input: &DocumentInput) -> RepoResult<String>;
    /// Deletes a document by id. Deleting a missing id succeeds.
    fn delete_document(&self, id: &str) -> RepoResult<()>;
    /// Lists documents, newest first.
    fn list_documents(&self, query: &DocumentListQuery) -> RepoResult<Vec<DocumentRecord>>;
    /// Blanks the stored cover of one document.
    fn clear_cover_photo(&self, id: &str) -> RepoResult<()>;
    /// Stores a file and returns its durable public reference.
    fn upload_asset(&self, bucket: AssetBucket, upload: &AssetUpload) -> RepoResult<String>;
}

impl<R: DocumentRepository + ?Sized> DocumentRepository for &R {
    fn get_document(&self, slug: &str) -> RepoResult<Option<DocumentRecord>> {
        (**self).get_document(slug)
    }

    fn save_document(&self, input: &DocumentInput) -> RepoResult<String> {
        (**self).save_document(input)
    }

    fn delete_document(&self, id: &str) -> RepoResult<()> {
        (**self).delete_document(id)
    }

    fn list_documents(&self, query: &DocumentListQuery) -> RepoResult<Vec<DocumentRecord>> {
        (**self).list_documents(query)
    }

    fn clear_cover_photo(&self, id: &str) -> RepoResult<()> {
        (**self).clear_cover_photo(id)
    }

    fn upload_asset(
        &self,
        bucket: AssetBucket,
        upload: &AssetUpload,
    ) -> RepoResult<String> {
        (**self).upload_asset(bucket, upload)
    }
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for table in ["documents", "assets"] {
            if !table_exists(conn, table)? {
                return Err(RepoError::MissingRequiredTable(table));
            }
        }
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn get_document(&self, slug: &str) -> RepoResult<Option<DocumentRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE slug = ?1;"))?;
        let mut rows = stmt.query([slug])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }
        Ok(None)
    }

    fn save_document(&self, input: &DocumentInput) -> RepoResult<String> {
        let title = if input.title.trim().is_empty() {
            UNTITLED
        } else {
            input.title.as_str()
        };
        let slug = resolve_slug(input)?;
        let tags_json = encode_json("tags", &input.tags)?;
        let blocks_json = encode_json("blocks", &input.blocks)?;

        match input.id.as_deref() {
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE documents
                     SET
                        slug = ?1,
                        title = ?2,
                        cover_photo = ?3,
                        category = ?4,
                        tags = ?5,
                        index_log = ?6,
                        blocks = ?7,
                        status = ?8,
                        updated_at = (strftime('%s', 'now') * 1000)
                     WHERE id = ?9;",
                    params![
                        slug.as_str(),
                        title,
                        input.cover_photo.as_str(),
                        input.category.as_str(),
                        tags_json,
                        input.index_log.as_str(),
                        blocks_json,
                        input.status.as_str(),
                        id,
                    ],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound(id.to_string()));
                }
            }
            None => {
                self.conn.execute(
                    "INSERT INTO documents (
                        id,
                        slug,
                        title,
                        cover_photo,
                        category,
                        tags,
                        index_log,
                        blocks,
                        status
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                    params![
                        Uuid::new_v4().to_string(),
                        slug.as_str(),
                        title,
                        input.cover_photo.as_str(),
                        input.category.as_str(),
                        tags_json,
                        input.index_log.as_str(),
                        blocks_json,
                        input.status.as_str(),
                    ],
                )?;
            }
        }

        Ok(slug)
    }

    fn delete_document(&self, id: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM documents WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn list_documents(&self, query: &DocumentListQuery) -> RepoResult<Vec<DocumentRecord>> {
        let mut sql = format!("{DOCUMENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(category) = query.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, rowid DESC");

        match query.limit {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }
            None if query.offset > 0 => sql.push_str(" LIMIT -1"),
            None => {}
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn clear_cover_photo(&self, id: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE documents
             SET
                cover_photo = '',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn upload_asset(&self, bucket: AssetBucket, upload: &AssetUpload) -> RepoResult<String> {
        if upload.bytes.is_empty() {
            return Err(RepoError::InvalidInput(format!(
                "asset `{}` is empty",
                upload.file_name
            )));
        }

        let asset_id = Uuid::new_v4().simple().to_string();
        let public_url = format!(
            "asset://{}/{}-{}",
            bucket.as_str(),
            asset_id,
            sanitize_file_name(&upload.file_name)
        );
        self.conn.execute(
            "INSERT INTO assets (
                id,
                bucket,
                file_name,
                content_type,
                bytes,
                public_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                asset_id,
                bucket.as_str(),
                upload.file_name.as_str(),
                upload.content_type.as_str(),
                upload.bytes.as_slice(),
                public_url.as_str(),
            ],
        )?;
        Ok(public_url)
    }
}

fn resolve_slug(input: &DocumentInput) -> RepoResult<String> {
    let explicit = input.slug.trim();
    if !explicit.is_empty() {
        return Ok(explicit.to_string());
    }

    let source = if input.title.is_empty() {
        "untitled"
    } else {
        input.title.as_str()
    };
    let derived = generate_slug(source);
    if derived.is_empty() {
        return Err(RepoError::InvalidInput(format!(
            "cannot derive a slug from title `{}`",
            input.title
        )));
    }
    Ok(derived)
}

fn encode_json<T: serde::Serialize + ?Sized>(field: &str, value: &T) -> RepoResult<String> {
    serde_json::to_string(value)
        .map_err(|err| RepoError::InvalidInput(format!("cannot encode `{field}`: {err}")))
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<DocumentRecord> {
    let id: String = row.get("id")?;

    let category_text: String = row.get("category")?;
    let category = DocumentCategory::parse(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in documents.category"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = DocumentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in documents.status"))
    })?;

    let tags_text: String = row.get("tags")?;
    let tags = serde_json::from_str::<Vec<String>>(&tags_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid tags for document `{id}`: {err}"))
    })?;

    let blocks_text: String = row.get("blocks")?;
    let blocks = serde_json::from_str::<Vec<Block>>(&blocks_text).map_err(|err| {
        RepoError::InvalidData(format!("invalid blocks for document `{id}`: {err}"))
    })?;

    Ok(DocumentRecord {
        slug: row.get("slug")?,
        title: row.get("title")?,
        cover_photo: row.get("cover_photo")?,
        category,
        tags,
        index_log: row.get("index_log")?,
        blocks,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::sanitize_file_name;

    #[test]
    fn file_names_are_reduced_to_url_safe_characters() {
        assert_eq!(sanitize_file_name("my cover (1).PNG"), "my_cover__1_.PNG");
        assert_eq!(sanitize_file_name("   "), "file");
    }
}
