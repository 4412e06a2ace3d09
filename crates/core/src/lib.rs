#![forbid(unsafe_code)]

pub mod ids {
    use std::borrow::Borrow;
    use std::fmt;

    /// Length of the tokens this crate generates. Peers may send other lengths.
    pub const ORIGIN_ID_LEN: usize = 12;
    const ORIGIN_ID_MAX_LEN: usize = 64;
    const ORIGIN_ALPHABET: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    /// Identifies the process instance that produced a change.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct OriginId(String);

    impl OriginId {
        /// Builds a fresh token. `pick(n)` must return an index below `n`; pass a CSPRNG.
        pub fn generate(mut pick: impl FnMut(usize) -> usize) -> Self {
            let value = (0..ORIGIN_ID_LEN)
                .map(|_| {
                    let index = pick(ORIGIN_ALPHABET.len()) % ORIGIN_ALPHABET.len();
                    char::from(ORIGIN_ALPHABET[index])
                })
                .collect();
            Self(value)
        }

        pub fn as_str(&self) -> &str {
            &self.0
        }

        pub fn into_string(self) -> String {
            self.0
        }

        pub fn try_new(value: impl Into<String>) -> Result<Self, OriginIdError> {
            let value = value.into();
            validate_origin_id(&value)?;
            Ok(Self(value))
        }
    }

    impl fmt::Display for OriginId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl Borrow<str> for OriginId {
        fn borrow(&self) -> &str {
            &self.0
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum OriginIdError {
        Empty,
        TooLong,
        InvalidChar { ch: char, index: usize },
    }

    impl fmt::Display for OriginIdError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Empty => write!(f, "origin id is empty"),
                Self::TooLong => write!(f, "origin id exceeds {ORIGIN_ID_MAX_LEN} chars"),
                Self::InvalidChar { ch, index } => {
                    write!(f, "origin id has invalid char {ch:?} at {index}")
                }
            }
        }
    }

    impl std::error::Error for OriginIdError {}

    fn validate_origin_id(value: &str) -> Result<(), OriginIdError> {
        if value.is_empty() {
            return Err(OriginIdError::Empty);
        }
        if value.len() > ORIGIN_ID_MAX_LEN {
            return Err(OriginIdError::TooLong);
        }
        for (index, ch) in value.chars().enumerate() {
            if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-') {
                continue;
            }
            return Err(OriginIdError::InvalidChar { ch, index });
        }
        Ok(())
    }
}

pub mod model {
    use crate::ids::OriginId;
    use std::fmt;

    /// Outcome of comparing the persisted schema version with the one the build requires.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct VersionCheck {
        pub persisted: i64,
        pub required: i64,
    }

    impl VersionCheck {
        pub fn is_compatible(&self) -> bool {
            self.persisted >= self.required
        }
    }

    impl fmt::Display for VersionCheck {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "persisted={}, required={}",
                self.persisted, self.required
            )
        }
    }

    /// Startup state of the store. `Ready` is terminal.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ReadinessState {
        Connecting,
        AwaitingSchema,
        Initializing,
        AwaitingUserSetup,
        VersionBlocked(VersionCheck),
        Ready,
    }

    impl ReadinessState {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Connecting => "connecting",
                Self::AwaitingSchema => "awaiting_schema",
                Self::Initializing => "initializing",
                Self::AwaitingUserSetup => "awaiting_user_setup",
                Self::VersionBlocked(_) => "version_blocked",
                Self::Ready => "ready",
            }
        }

        pub fn is_ready(self) -> bool {
            matches!(self, Self::Ready)
        }

        /// Halted states that need a human (setup UI, operator migration) to move on.
        pub fn is_blocked(self) -> bool {
            matches!(self, Self::AwaitingUserSetup | Self::VersionBlocked(_))
        }
    }

    impl fmt::Display for ReadinessState {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::VersionBlocked(check) => write!(f, "version_blocked ({check})"),
                other => f.write_str(other.as_str()),
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum SchemaPresence {
        Absent,
        Complete,
        Partial { missing: Vec<&'static str> },
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct OriginRecord {
        pub id: OriginId,
        pub created_at: String,
    }
}

#[cfg(test)]
mod tests {
    use super::ids::{OriginId, OriginIdError};
    use super::model::{ReadinessState, VersionCheck};
    use std::collections::HashSet;

    #[test]
    fn origin_id_validation() {
        assert_eq!(OriginId::try_new("").unwrap_err(), OriginIdError::Empty);
        assert_eq!(
            OriginId::try_new("a".repeat(65)).unwrap_err(),
            OriginIdError::TooLong
        );
        assert_eq!(
            OriginId::try_new("ab cd").unwrap_err(),
            OriginIdError::InvalidChar { ch: ' ', index: 2 }
        );
        assert!(OriginId::try_new("Xk3_9-aZ01bc").is_ok());
    }

    #[test]
    fn generated_origin_ids_are_valid_tokens() {
        let mut next = 0usize;
        let id = OriginId::generate(|n| {
            next += 7;
            next % n
        });
        assert_eq!(id.as_str().len(), super::ids::ORIGIN_ID_LEN);
        assert!(OriginId::try_new(id.as_str()).is_ok());

        let clamped = OriginId::generate(|n| n + 3);
        assert_eq!(clamped.as_str(), "DDDDDDDDDDDD");
    }

    #[test]
    fn origin_ids_are_found_by_str_in_sets() {
        let mut set = HashSet::new();
        set.insert(OriginId::try_new("abcDEF123456").expect("valid id"));
        assert!(set.contains("abcDEF123456"));
        assert!(!set.contains("abcDEF123457"));
    }

    #[test]
    fn version_check_compares_numerically() {
        let behind = VersionCheck {
            persisted: 3,
            required: 5,
        };
        assert!(!behind.is_compatible());
        assert_eq!(behind.to_string(), "persisted=3, required=5");
        assert!(
            VersionCheck {
                persisted: 12,
                required: 5
            }
            .is_compatible()
        );
        assert!(
            VersionCheck {
                persisted: 5,
                required: 5
            }
            .is_compatible()
        );
    }

    #[test]
    fn readiness_state_classification() {
        let blocked = ReadinessState::VersionBlocked(VersionCheck {
            persisted: 0,
            required: 5,
        });
        assert!(blocked.is_blocked());
        assert!(ReadinessState::AwaitingUserSetup.is_blocked());
        assert!(!ReadinessState::Initializing.is_blocked());
        assert!(ReadinessState::Ready.is_ready());
        assert_eq!(
            blocked.to_string(),
            "version_blocked (persisted=0, required=5)"
        );
    }
}
