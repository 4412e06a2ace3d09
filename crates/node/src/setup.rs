#![forbid(unsafe_code)]

use arbor_core::model::ReadinessState;
use arbor_gate::{BootstrapGate, GateError};

/// Non-interactive user setup: stores the account name, then releases the gate.
pub(crate) fn complete_user_setup(
    gate: &BootstrapGate,
    username: &str,
) -> Result<ReadinessState, GateError> {
    let store = gate
        .connected_store()
        .ok_or(GateError::InvalidTransition { from: gate.state() })?;
    store.with(|store| store.set_username(username))?;
    log::info!("user setup stored username={username}; completing bootstrap");
    gate.force_ready_from_user_setup()
}
