#![forbid(unsafe_code)]

use crate::{GateError, StoreHandle};
use arbor_core::model::{ReadinessState, SchemaPresence, VersionCheck};
use arbor_storage::{APP_DB_VERSION, SchemaInitializer, SqliteStore, StoreError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

#[derive(Clone, Debug)]
pub struct GateConfig {
    pub storage_dir: PathBuf,
    pub required_version: i64,
}

impl GateConfig {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            required_version: APP_DB_VERSION,
        }
    }

    pub fn with_required_version(mut self, required_version: i64) -> Self {
        self.required_version = required_version;
        self
    }
}

/// Owns the process-wide readiness state of the store.
///
/// Cloning is cheap and every clone observes the same state. `Ready` is
/// reached at most once and never left; waiters are released through a
/// `watch` channel so any number of them see the same resolution.
#[derive(Clone, Debug)]
pub struct BootstrapGate {
    inner: Arc<GateInner>,
}

#[derive(Debug)]
struct GateInner {
    config: GateConfig,
    initializer: SchemaInitializer,
    started: AtomicBool,
    state: watch::Sender<ReadinessState>,
    store: OnceLock<StoreHandle>,
}

impl BootstrapGate {
    pub fn new(config: GateConfig) -> Self {
        let initializer = SchemaInitializer::new(config.required_version);
        Self::with_initializer(config, initializer)
    }

    pub fn with_initializer(config: GateConfig, initializer: SchemaInitializer) -> Self {
        let (state, _) = watch::channel(ReadinessState::Connecting);
        Self {
            inner: Arc::new(GateInner {
                config,
                initializer,
                started: AtomicBool::new(false),
                state,
                store: OnceLock::new(),
            }),
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ReadinessState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.inner.state.subscribe()
    }

    /// The opened connection, available from `AwaitingSchema` on. Before
    /// `Ready` it is only meant for status probes and the user-setup flow.
    pub fn connected_store(&self) -> Option<StoreHandle> {
        self.inner.store.get().cloned()
    }

    /// Runs the bootstrap state machine once. Returns the state it halted in.
    ///
    /// `Err` values with [`GateError::is_fatal`] mean the store is unusable and
    /// the process should exit; blocked states are returned as `Ok`.
    pub fn start_bootstrap(&self) -> Result<ReadinessState, GateError> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(GateError::AlreadyStarted);
        }

        let storage_dir = &self.inner.config.storage_dir;
        log::info!("connecting to store in {}", storage_dir.display());
        let store = SqliteStore::open(storage_dir).map_err(GateError::Connect)?;
        let handle = self.inner.store.get_or_init(|| StoreHandle::new(store));
        let mut store = handle.lock()?;
        self.transition(ReadinessState::AwaitingSchema);

        match store.schema_presence().map_err(GateError::Detect)? {
            SchemaPresence::Absent => {
                log::info!("connected to store, but schema doesn't exist; initializing schema");
                self.transition(ReadinessState::Initializing);
                let report = store
                    .initialize_schema(&self.inner.initializer)
                    .map_err(GateError::Initialize)?;
                log::info!(
                    "schema and initial content created (start_note={}, sync_rows={}); waiting for user setup",
                    report.start_note_id,
                    report.sync_rows
                );
                // A fresh store has no account yet, so the signal stays pending.
                self.transition(ReadinessState::AwaitingUserSetup);
            }
            SchemaPresence::Partial { missing } => {
                return Err(GateError::Detect(StoreError::PartialSchema { missing }));
            }
            SchemaPresence::Complete => {
                if !store.is_user_initialized().map_err(GateError::Detect)? {
                    log::info!("user account not configured; store not ready");
                    self.transition(ReadinessState::AwaitingUserSetup);
                } else {
                    let check = store
                        .check_version(self.inner.config.required_version)
                        .map_err(GateError::Detect)?;
                    self.settle_version(ReadinessState::AwaitingSchema, check)?;
                }
            }
        }

        Ok(self.state())
    }

    /// Completes user setup: `AwaitingUserSetup` -> `Ready`.
    ///
    /// Only valid once, from `AwaitingUserSetup`, after the setup flow stored a
    /// username. A store whose version is behind moves to `VersionBlocked`.
    pub fn force_ready_from_user_setup(&self) -> Result<ReadinessState, GateError> {
        let state = self.state();
        if state != ReadinessState::AwaitingUserSetup {
            return Err(GateError::InvalidTransition { from: state });
        }
        let handle = self
            .connected_store()
            .ok_or(GateError::InvalidTransition { from: state })?;

        // Concurrent callers serialize here; the loser sees the new state below.
        let store = handle.lock()?;
        if !store.is_user_initialized()? {
            return Err(GateError::UserNotInitialized);
        }
        let check = store.check_version(self.inner.config.required_version)?;
        self.settle_version(ReadinessState::AwaitingUserSetup, check)?;
        Ok(self.state())
    }

    /// Resolves once the gate reaches `Ready`, with the store handle. There is
    /// no built-in timeout.
    pub async fn await_ready(&self) -> Result<StoreHandle, GateError> {
        let mut state = self.inner.state.subscribe();
        state
            .wait_for(|state| state.is_ready())
            .await
            .map_err(|_| GateError::Closed)?;
        self.connected_store().ok_or(GateError::Closed)
    }

    pub fn is_user_initialized(&self) -> Result<bool, GateError> {
        match self.connected_store() {
            Some(store) => store.with(|store| store.is_user_initialized()),
            None => Ok(false),
        }
    }

    /// `None` until the store has been opened.
    pub fn version_status(&self) -> Result<Option<VersionCheck>, GateError> {
        let required = self.inner.config.required_version;
        match self.connected_store() {
            Some(store) => store.with(|store| store.check_version(required)).map(Some),
            None => Ok(None),
        }
    }

    pub fn is_version_compatible(&self) -> Result<bool, GateError> {
        Ok(self
            .version_status()?
            .is_some_and(|check| check.is_compatible()))
    }

    fn settle_version(
        &self,
        from: ReadinessState,
        check: VersionCheck,
    ) -> Result<(), GateError> {
        if check.is_compatible() {
            self.transition_from(from, ReadinessState::Ready)?;
            log::info!("store ready");
        } else {
            log::warn!("schema version mismatch ({check}); migration needed");
            self.transition_from(from, ReadinessState::VersionBlocked(check))?;
        }
        Ok(())
    }

    fn transition(&self, next: ReadinessState) {
        let previous = self.inner.state.send_replace(next);
        log::info!("bootstrap state {previous} -> {next}");
    }

    fn transition_from(
        &self,
        from: ReadinessState,
        next: ReadinessState,
    ) -> Result<(), GateError> {
        let mut observed = from;
        let moved = self.inner.state.send_if_modified(|state| {
            if *state == from {
                *state = next;
                true
            } else {
                observed = *state;
                false
            }
        });
        if !moved {
            return Err(GateError::InvalidTransition { from: observed });
        }
        log::info!("bootstrap state {from} -> {next}");
        Ok(())
    }
}
