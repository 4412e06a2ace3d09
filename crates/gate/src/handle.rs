#![forbid(unsafe_code)]

use crate::GateError;
use arbor_storage::{SqliteStore, StoreError};
use std::sync::{Arc, Mutex, MutexGuard};

/// The single shared connection. Access is serialized; the lock is never held
/// across an `.await`.
#[derive(Clone, Debug)]
pub struct StoreHandle {
    inner: Arc<Mutex<SqliteStore>>,
}

impl StoreHandle {
    pub(crate) fn new(store: SqliteStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn with<R>(
        &self,
        f: impl FnOnce(&mut SqliteStore) -> Result<R, StoreError>,
    ) -> Result<R, GateError> {
        let mut store = self.lock()?;
        f(&mut store).map_err(GateError::Store)
    }

    pub fn same_store(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, SqliteStore>, GateError> {
        self.inner.lock().map_err(|_| GateError::LockPoisoned)
    }
}
