//! Local key-value store for drafts and previews.
//!
//! # Responsibility
//! - Provide the small string key-value contract the autosave pipeline and
//!   preview flow write through.
//! - Offer a SQLite-backed store for hosts and an in-memory store for tests.
//!
//! # Invariants
//! - `get` of a missing key is `Ok(None)`.
//! - `remove` of a missing key succeeds.
//! - A write that would push total usage past the quota fails with
//!   `QuotaExceeded` and leaves previous contents untouched.

use crate::db::{open_db, open_db_in_memory, table_exists, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type LocalStoreResult<T> = Result<T, LocalStoreError>;

/// Local store error.
#[derive(Debug)]
pub enum LocalStoreError {
    Db(DbError),
    /// Write rejected because the store is full.
    QuotaExceeded {
        key: String,
        required_bytes: usize,
        quota_bytes: usize,
    },
    /// Connection schema lacks the entries table.
    MissingRequiredTable(&'static str),
}

impl Display for LocalStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                required_bytes,
                quota_bytes,
            } => write!(
                f,
                "local store quota exceeded writing `{key}`: {required_bytes} bytes needed, quota is {quota_bytes}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "local store requires table `{table}`")
            }
        }
    }
}

impl Error for LocalStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for LocalStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for LocalStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// String key-value store surviving page reloads / app restarts.
pub trait LocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> LocalStoreResult<()>;
    fn remove(&mut self, key: &str) -> LocalStoreResult<()>;
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

fn check_quota(
    key: &str,
    used_by_others: usize,
    value: &str,
    quota_bytes: Option<usize>,
) -> LocalStoreResult<()> {
    let Some(quota_bytes) = quota_bytes else {
        return Ok(());
    };
    let required_bytes = used_by_others + entry_size(key, value);
    if required_bytes > quota_bytes {
        return Err(LocalStoreError::QuotaExceeded {
            key: key.to_string(),
            required_bytes,
            quota_bytes,
        });
    }
    Ok(())
}

/// SQLite-backed local store owning its own connection.
pub struct SqliteLocalStore {
    conn: Connection,
    quota_bytes: Option<usize>,
}

impl SqliteLocalStore {
    /// Opens (and migrates) a database file dedicated to local entries.
    pub fn open(path: impl AsRef<Path>) -> LocalStoreResult<Self> {
        Self::from_connection(open_db(path)?)
    }

    pub fn open_in_memory() -> LocalStoreResult<Self> {
        Self::from_connection(open_db_in_memory()?)
    }

    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when migrations have not been applied.
    pub fn from_connection(conn: Connection) -> LocalStoreResult<Self> {
        if !table_exists(&conn, "local_entries")? {
            return Err(LocalStoreError::MissingRequiredTable("local_entries"));
        }
        Ok(Self {
            conn,
            quota_bytes: None,
        })
    }

    /// Caps total stored bytes (keys + values).
    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Borrowed connection, shared with the document repository.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn bytes_used_except(&self, key: &str) -> LocalStoreResult<usize> {
        let used: i64 = self.conn.query_row(
            "SELECT COALESCE(
                SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))),
                0
            )
            FROM local_entries
            WHERE key <> ?1;",
            [key],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(used).unwrap_or(usize::MAX))
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> LocalStoreResult<()> {
        if self.quota_bytes.is_some() {
            let used_by_others = self.bytes_used_except(key)?;
            check_quota(key, used_by_others, value, self.quota_bytes)?;
        }
        self.conn.execute(
            "INSERT INTO local_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> LocalStoreResult<()> {
        self.conn
            .execute("DELETE FROM local_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// In-memory local store.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocalStore {
    entries: BTreeMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> LocalStoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> LocalStoreResult<()> {
        let used_by_others = self
            .entries
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(k, v)| entry_size(k, v))
            .sum();
        check_quota(key, used_by_others, value, self.quota_bytes)?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> LocalStoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LocalStore, LocalStoreError, MemoryLocalStore, SqliteLocalStore};

    #[test]
    fn memory_store_round_trips_and_removes() {
        let mut store = MemoryLocalStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn memory_store_quota_rejects_and_keeps_previous_value() {
        let mut store = MemoryLocalStore::with_quota(10);
        store.set("k", "small").unwrap();
        let err = store.set("k", "far too large value").unwrap_err();
        assert!(matches!(err, LocalStoreError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn sqlite_store_overwrites_and_enforces_quota() {
        let mut store = SqliteLocalStore::open_in_memory().unwrap().with_quota(16);
        store.set("key", "value").unwrap();
        store.set("key", "other").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("other"));

        let err = store.set("second", "0123456789").unwrap_err();
        assert!(matches!(err, LocalStoreError::QuotaExceeded { .. }));
        assert!(store.get("second").unwrap().is_none());
    }
}
