#![forbid(unsafe_code)]

mod error;
mod options;
mod origins;
mod schema;
mod version;

pub use error::StoreError;
pub use schema::{CORE_TABLES, InitScript, SchemaInitializer, SeedReport};

use arbor_core::model::SchemaPresence;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

/// Schema version this build expects to find in the `db_version` option.
pub const APP_DB_VERSION: i64 = 5;
pub const DB_FILE_NAME: &str = "document.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        // SQLite opens lazily; a corrupt file only surfaces on the first read.
        conn.query_row("SELECT COUNT(1) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        Ok(Self { conn, storage_dir })
    }

    /// Opens an existing store without write access. `Ok(None)` when there is
    /// no database file yet; nothing is created on disk.
    pub fn open_read_only(storage_dir: impl AsRef<Path>) -> Result<Option<Self>, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        let db_path = storage_dir.join(DB_FILE_NAME);
        if !db_path.is_file() {
            return Ok(None);
        }

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.query_row("SELECT COUNT(1) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })?;

        Ok(Some(Self { conn, storage_dir }))
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(DB_FILE_NAME)
    }

    pub fn schema_presence(&self) -> Result<SchemaPresence, StoreError> {
        let tables = user_tables(&self.conn)?;
        let missing = CORE_TABLES
            .iter()
            .copied()
            .filter(|table| !tables.contains(*table))
            .collect::<Vec<_>>();

        if missing.is_empty() {
            Ok(SchemaPresence::Complete)
        } else if missing.len() == CORE_TABLES.len() {
            Ok(SchemaPresence::Absent)
        } else {
            Ok(SchemaPresence::Partial { missing })
        }
    }

    /// Applies every init script and derived seed step in one transaction.
    pub fn initialize_schema(
        &mut self,
        initializer: &SchemaInitializer,
    ) -> Result<SeedReport, StoreError> {
        match self.schema_presence()? {
            SchemaPresence::Absent => {}
            SchemaPresence::Complete => {
                return Err(StoreError::InvalidInput("schema is already initialized"));
            }
            SchemaPresence::Partial { missing } => {
                return Err(StoreError::PartialSchema { missing });
            }
        }

        let tx = self.conn.transaction()?;
        let report = initializer.apply(&tx)?;
        tx.commit()?;
        Ok(report)
    }

    pub(crate) fn table_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some())
    }
}

fn user_tables(conn: &Connection) -> Result<BTreeSet<String>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }
    Ok(tables)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

/// UTC timestamp with fixed millisecond width, so text order matches time order.
pub(crate) fn now_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
        ))
        .unwrap_or_else(|_| "1970-01-01T00:00:00.000Z".to_string())
}
