#![forbid(unsafe_code)]

//! Startup gating for the document store and the change-origin registry that
//! the sync layer uses to recognise its own writes.

mod error;
mod gate;
mod handle;
mod origin;

pub use error::GateError;
pub use gate::{BootstrapGate, GateConfig};
pub use handle::StoreHandle;
pub use origin::ChangeOriginRegistry;
