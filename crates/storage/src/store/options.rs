#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError};
use rusqlite::OptionalExtension;
use rusqlite::params;

pub(crate) const USERNAME_OPTION: &str = "username";
pub(crate) const DB_VERSION_OPTION: &str = "db_version";

impl SqliteStore {
    /// Reads a named option. A store without an `options` table has no options.
    pub fn option(&self, name: &str) -> Result<Option<String>, StoreError> {
        if !self.table_exists("options")? {
            return Ok(None);
        }
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM options WHERE name = ?1",
                params![name],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten())
    }

    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), StoreError> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidInput("option name must not be empty"));
        }
        let now = super::now_timestamp();
        self.conn.execute(
            r#"
            INSERT INTO options(name, value, is_synced, date_modified)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(name) DO UPDATE SET value=excluded.value, date_modified=excluded.date_modified
            "#,
            params![name, value, now],
        )?;
        Ok(())
    }

    pub fn is_user_initialized(&self) -> Result<bool, StoreError> {
        Ok(self
            .option(USERNAME_OPTION)?
            .is_some_and(|username| !username.trim().is_empty()))
    }

    /// Records the account name; credential handling belongs to the setup flow.
    pub fn set_username(&mut self, username: &str) -> Result<(), StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(StoreError::InvalidInput("username must not be empty"));
        }
        self.set_option(USERNAME_OPTION, username)
    }
}
