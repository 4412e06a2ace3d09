#![forbid(unsafe_code)]

use super::{SqliteStore, StoreError};
use arbor_core::ids::OriginId;
use arbor_core::model::OriginRecord;
use rusqlite::params;

impl SqliteStore {
    /// Appends an origin record. Records are never updated or deleted.
    pub fn insert_origin(&mut self, id: &OriginId) -> Result<OriginRecord, StoreError> {
        let record = OriginRecord {
            id: id.clone(),
            created_at: super::now_timestamp(),
        };

        let insert = self.conn.execute(
            "INSERT INTO origin_records(id, created_at) VALUES (?1, ?2)",
            params![record.id.as_str(), record.created_at],
        );
        match insert {
            Ok(_) => Ok(record),
            Err(err) if super::is_constraint_violation(&err) => {
                Err(StoreError::InvalidInput("origin id is already recorded"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Every persisted origin id, newest first. Rows that are not valid ids
    /// (written by another peer or a hand edit) are skipped with a warning.
    pub fn origin_ids(&self) -> Result<Vec<OriginId>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM origin_records ORDER BY created_at DESC, id ASC")?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let raw = row.get::<_, String>(0)?;
            match OriginId::try_new(raw.as_str()) {
                Ok(id) => out.push(id),
                Err(err) => log::warn!("skipping origin record {raw:?}: {err}"),
            }
        }
        Ok(out)
    }
}
