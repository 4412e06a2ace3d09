#![forbid(unsafe_code)]

use super::options::DB_VERSION_OPTION;
use super::{SqliteStore, StoreError};
use arbor_core::model::VersionCheck;

impl SqliteStore {
    /// Persisted schema version. Missing or non-numeric values count as 0.
    pub fn db_version(&self) -> Result<i64, StoreError> {
        Ok(self
            .option(DB_VERSION_OPTION)?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0))
    }

    /// Read-only: never migrates.
    pub fn check_version(&self, required: i64) -> Result<VersionCheck, StoreError> {
        Ok(VersionCheck {
            persisted: self.db_version()?,
            required,
        })
    }
}
