#![forbid(unsafe_code)]

mod sql;

use super::options::DB_VERSION_OPTION;
use super::{APP_DB_VERSION, StoreError};
use rusqlite::{Connection, OptionalExtension, params};

/// Tables whose joint presence marks an initialized store.
pub const CORE_TABLES: &[&str] = &[
    "notes",
    "branches",
    "images",
    "note_images",
    "options",
    "origin_records",
    "sync",
];

// (name, value, is_synced)
const DEFAULT_OPTIONS: &[(&str, &str, bool)] = &[
    ("sync_server_host", "", false),
    ("sync_server_timeout", "5000", false),
    ("last_synced_pull", "0", false),
    ("last_synced_push", "0", false),
    ("protected_session_timeout", "600", true),
];

// (entity_name, key column, extra filter)
const SYNCED_ENTITIES: &[(&str, &str, &str)] = &[
    ("notes", "note_id", ""),
    ("branches", "branch_id", ""),
    ("images", "image_id", ""),
    ("note_images", "note_image_id", ""),
    ("options", "name", "WHERE is_synced = 1"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitScript {
    pub name: String,
    pub sql: String,
}

impl InitScript {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedReport {
    pub start_note_id: String,
    pub sync_rows: usize,
}

/// Ordered schema/seed scripts plus the derived seed steps that follow them.
#[derive(Clone, Debug)]
pub struct SchemaInitializer {
    scripts: Vec<InitScript>,
    db_version: i64,
}

impl Default for SchemaInitializer {
    fn default() -> Self {
        Self::new(APP_DB_VERSION)
    }
}

impl SchemaInitializer {
    /// Bundled scripts, stamping `db_version` into the seeded options.
    pub fn new(db_version: i64) -> Self {
        let scripts = sql::SCRIPTS
            .iter()
            .map(|(name, sql)| InitScript::new(*name, *sql))
            .collect();
        Self::with_scripts(scripts, db_version)
    }

    pub fn with_scripts(scripts: Vec<InitScript>, db_version: i64) -> Self {
        Self {
            scripts,
            db_version,
        }
    }

    pub fn scripts(&self) -> &[InitScript] {
        &self.scripts
    }

    pub fn db_version(&self) -> i64 {
        self.db_version
    }

    /// Runs inside the caller's transaction; the caller commits or drops it.
    pub(crate) fn apply(&self, conn: &Connection) -> Result<SeedReport, StoreError> {
        for script in &self.scripts {
            conn.execute_batch(&script.sql)
                .map_err(|err| StoreError::seed(script.name.as_str(), err))?;
        }

        let start_note_id =
            pick_start_note(conn).map_err(|err| StoreError::seed("start_note", err))?;
        let now = super::now_timestamp();
        init_options(conn, &start_note_id, self.db_version, &now)
            .map_err(|err| StoreError::seed("options", err))?;
        let sync_rows =
            fill_all_sync_rows(conn, &now).map_err(|err| StoreError::seed("sync_rows", err))?;

        Ok(SeedReport {
            start_note_id,
            sync_rows,
        })
    }
}

fn pick_start_note(conn: &Connection) -> Result<String, StoreError> {
    conn.query_row(
        "SELECT note_id FROM branches \
         WHERE parent_note_id = 'root' AND is_deleted = 0 \
         ORDER BY note_position ASC LIMIT 1",
        [],
        |row| row.get::<_, String>(0),
    )
    .optional()?
    .ok_or(StoreError::InvalidInput("seed data has no start note"))
}

fn init_options(
    conn: &Connection,
    start_note_id: &str,
    db_version: i64,
    now: &str,
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "INSERT INTO options(name, value, is_synced, date_modified) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let db_version = db_version.to_string();
    stmt.execute(params![DB_VERSION_OPTION, db_version, false, now])?;
    stmt.execute(params!["start_note_id", start_note_id, false, now])?;
    for (name, value, is_synced) in DEFAULT_OPTIONS {
        stmt.execute(params![name, value, is_synced, now])?;
    }
    Ok(())
}

fn fill_all_sync_rows(conn: &Connection, now: &str) -> Result<usize, StoreError> {
    let mut total = 0usize;
    for (entity_name, key_column, filter) in SYNCED_ENTITIES {
        total += conn.execute(
            &format!(
                "INSERT INTO sync(entity_name, entity_id, sync_date) \
                 SELECT ?1, {key_column}, ?2 FROM {entity_name} {filter}"
            ),
            params![entity_name, now],
        )?;
    }
    Ok(total)
}
