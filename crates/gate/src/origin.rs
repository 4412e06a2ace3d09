#![forbid(unsafe_code)]

use crate::{BootstrapGate, GateError, StoreHandle};
use arbor_core::ids::OriginId;
use rand::Rng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::Mutex;

/// Tags local writes with an origin id and recognises ids this store handed out.
///
/// Membership checks read an in-memory cache rather than the store, so an id
/// inserted by another process sharing the store is only seen after the next
/// [`refresh`](Self::refresh). Ids generated here are visible as soon as
/// [`generate_origin`](Self::generate_origin) returns.
#[derive(Debug)]
pub struct ChangeOriginRegistry {
    gate: BootstrapGate,
    current: OriginId,
    current_persisted: AtomicBool,
    known: RwLock<HashSet<OriginId>>,
    // Generation, persistence and refresh run one at a time.
    writer: Mutex<()>,
}

impl ChangeOriginRegistry {
    /// Creates the process origin in memory; nothing touches the store yet.
    pub fn new(gate: BootstrapGate) -> Self {
        Self {
            gate,
            current: create_origin_id(),
            current_persisted: AtomicBool::new(false),
            known: RwLock::new(HashSet::new()),
            writer: Mutex::new(()),
        }
    }

    pub fn current_origin(&self) -> &OriginId {
        &self.current
    }

    /// Waits for the gate, then records the process origin and loads the
    /// cache. Later calls are no-ops.
    pub async fn persist_current_when_ready(&self) -> Result<(), GateError> {
        let store = self.gate.await_ready().await?;
        let _writer = self.writer.lock().await;
        if self.current_persisted.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.save_and_refresh(&store, &self.current)?;
        self.current_persisted.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Generates, persists and caches a new origin id. Fails with
    /// [`GateError::NotReady`] before the gate is `Ready`.
    pub async fn generate_origin(&self) -> Result<OriginId, GateError> {
        let store = self.ready_store()?;
        let _writer = self.writer.lock().await;
        let id = create_origin_id();
        self.save_and_refresh(&store, &id)?;
        Ok(id)
    }

    pub fn is_local_origin(&self, id: &str) -> bool {
        self.known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Reloads the cache from the store. Returns the number of known ids.
    pub async fn refresh(&self) -> Result<usize, GateError> {
        let store = self.ready_store()?;
        let _writer = self.writer.lock().await;
        let ids = store.with(|store| store.origin_ids())?;
        Ok(self.replace_known(ids))
    }

    fn ready_store(&self) -> Result<StoreHandle, GateError> {
        let state = self.gate.state();
        if !state.is_ready() {
            return Err(GateError::NotReady { state });
        }
        self.gate
            .connected_store()
            .ok_or(GateError::NotReady { state })
    }

    fn save_and_refresh(&self, store: &StoreHandle, id: &OriginId) -> Result<(), GateError> {
        let ids = store.with(|store| {
            store.insert_origin(id)?;
            store.origin_ids()
        })?;
        self.replace_known(ids);
        Ok(())
    }

    fn replace_known(&self, ids: Vec<OriginId>) -> usize {
        let mut known = self.known.write().unwrap_or_else(PoisonError::into_inner);
        *known = ids.into_iter().collect();
        known.len()
    }
}

fn create_origin_id() -> OriginId {
    let mut rng = rand::rng();
    let id = OriginId::generate(|len| rng.random_range(0..len));
    log::info!("generated origin id={id}");
    id
}
