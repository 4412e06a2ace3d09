#![forbid(unsafe_code)]

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Sql(rusqlite::Error),
    InvalidInput(&'static str),
    PartialSchema {
        missing: Vec<&'static str>,
    },
    Seed {
        step: String,
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQLITE",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::PartialSchema { .. } => "RESET_REQUIRED",
            Self::Seed { .. } => "SEED_FAILED",
        }
    }

    pub(crate) fn seed(step: impl Into<String>, source: impl Into<StoreError>) -> Self {
        Self::Seed {
            step: step.into(),
            source: Box::new(source.into()),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Sql(err) => write!(f, "sqlite: {err}"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::PartialSchema { missing } => write!(
                f,
                "partial schema detected (missing={})",
                missing.join(",")
            ),
            Self::Seed { step, source } => write!(f, "seed step {step} failed: {source}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sql(err) => Some(err),
            Self::Seed { source, .. } => Some(source.as_ref()),
            Self::InvalidInput(_) | Self::PartialSchema { .. } => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sql(value)
    }
}
