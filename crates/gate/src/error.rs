#![forbid(unsafe_code)]

use arbor_core::model::ReadinessState;
use arbor_storage::StoreError;

#[derive(Debug)]
pub enum GateError {
    Connect(StoreError),
    Detect(StoreError),
    Initialize(StoreError),
    Store(StoreError),
    LockPoisoned,
    AlreadyStarted,
    InvalidTransition { from: ReadinessState },
    NotReady { state: ReadinessState },
    UserNotInitialized,
    Closed,
}

impl GateError {
    /// Whether the process must log and exit instead of staying up.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connect(_) | Self::Detect(_) | Self::Initialize(_)
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Connect(_) => "CONNECT_FAILED",
            Self::Detect(_) => "SCHEMA_DETECT_FAILED",
            Self::Initialize(_) => "INIT_FAILED",
            Self::Store(err) => err.code(),
            Self::LockPoisoned => "LOCK_POISONED",
            Self::AlreadyStarted => "ALREADY_STARTED",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotReady { .. } => "NOT_READY",
            Self::UserNotInitialized => "USER_NOT_INITIALIZED",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect(err) => write!(f, "cannot open store: {err}"),
            Self::Detect(err) => write!(f, "cannot inspect store schema: {err}"),
            Self::Initialize(err) => write!(f, "schema initialization failed: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
            Self::AlreadyStarted => write!(f, "bootstrap already started"),
            Self::InvalidTransition { from } => {
                write!(f, "transition is invalid from state {from}")
            }
            Self::NotReady { state } => write!(f, "store is not ready (state={state})"),
            Self::UserNotInitialized => write!(f, "user setup reported done but no username is stored"),
            Self::Closed => write!(f, "readiness channel closed"),
        }
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect(err) | Self::Detect(err) | Self::Initialize(err) | Self::Store(err) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl From<StoreError> for GateError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}
