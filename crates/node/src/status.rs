#![forbid(unsafe_code)]

use arbor_core::model::{ReadinessState, SchemaPresence};
use arbor_gate::{BootstrapGate, ChangeOriginRegistry, GateError};
use arbor_storage::{SqliteStore, StoreError};
use serde::Serialize;
use std::path::Path;

/// Snapshot of the startup probes, for explaining why the store is not ready.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct StatusReport {
    pub(crate) state: String,
    pub(crate) ready: bool,
    pub(crate) user_initialized: bool,
    pub(crate) persisted_version: Option<i64>,
    pub(crate) required_version: i64,
    pub(crate) version_compatible: bool,
    pub(crate) current_origin: Option<String>,
    pub(crate) data_dir: String,
}

impl StatusReport {
    pub(crate) fn collect(
        gate: &BootstrapGate,
        registry: &ChangeOriginRegistry,
    ) -> Result<Self, GateError> {
        let state = gate.state();
        let version = gate.version_status()?;
        Ok(Self {
            state: state.as_str().to_string(),
            ready: state.is_ready(),
            user_initialized: gate.is_user_initialized()?,
            persisted_version: version.map(|check| check.persisted),
            required_version: gate.config().required_version,
            version_compatible: version.is_some_and(|check| check.is_compatible()),
            current_origin: Some(registry.current_origin().to_string()),
            data_dir: gate.config().storage_dir.display().to_string(),
        })
    }

    /// Reads the probes straight from disk without bootstrapping. Never creates,
    /// initializes or writes the store, and reports no process origin.
    pub(crate) fn inspect(data_dir: &Path, required_version: i64) -> Result<Self, StoreError> {
        let mut report = Self {
            state: ReadinessState::AwaitingSchema.as_str().to_string(),
            ready: false,
            user_initialized: false,
            persisted_version: None,
            required_version,
            version_compatible: false,
            current_origin: None,
            data_dir: data_dir.display().to_string(),
        };
        let Some(store) = SqliteStore::open_read_only(data_dir)? else {
            return Ok(report);
        };

        match store.schema_presence()? {
            SchemaPresence::Absent => return Ok(report),
            SchemaPresence::Partial { missing } => {
                return Err(StoreError::PartialSchema { missing });
            }
            SchemaPresence::Complete => {}
        }

        let check = store.check_version(required_version)?;
        report.user_initialized = store.is_user_initialized()?;
        report.persisted_version = Some(check.persisted);
        report.version_compatible = check.is_compatible();
        let state = if !report.user_initialized {
            ReadinessState::AwaitingUserSetup
        } else if check.is_compatible() {
            ReadinessState::Ready
        } else {
            ReadinessState::VersionBlocked(check)
        };
        report.state = state.as_str().to_string();
        report.ready = state.is_ready();
        Ok(report)
    }

    pub(crate) fn blocked_reason(&self) -> Option<String> {
        if self.ready {
            return None;
        }
        if self.state == ReadinessState::AwaitingSchema.as_str() {
            return Some("store has no schema yet; it is created on the next start".to_string());
        }
        if !self.user_initialized {
            return Some(
                "waiting for user setup (pass --setup-username or finish setup in the UI)"
                    .to_string(),
            );
        }
        if !self.version_compatible {
            return Some(format!(
                "store schema version {} is older than required {}; migration needed",
                self.persisted_version.unwrap_or(0),
                self.required_version
            ));
        }
        Some(format!("store is {}", self.state))
    }
}
