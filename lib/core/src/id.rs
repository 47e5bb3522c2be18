//! Strongly-typed identifiers used for tracing chat activity.
//!
//! Session keys are caller-chosen opaque strings and are not modeled here.
//! The IDs below are minted by parley itself so a single chat request and
//! the provider call it triggers can be correlated in logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an ID from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse.
    pub id_type: &'static str,
    /// The reason for the parse failure.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Creates a new ID with a randomly generated ULID.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let ulid_str = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);

                Ulid::from_str(ulid_str)
                    .map(Self)
                    .map_err(|e| ParseIdError {
                        id_type: stringify!($name),
                        reason: e.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifies one user-facing chat action (send, regenerate, ...).
    RequestId,
    "req"
);

define_id!(
    /// Identifies one call to a model provider.
    GenerationId,
    "gen"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_display_format() {
        let id = RequestId::new();
        assert!(id.to_string().starts_with("req_"));
    }

    #[test]
    fn generation_id_display_format() {
        let id = GenerationId::new();
        assert!(id.to_string().starts_with("gen_"));
    }

    #[test]
    fn parse_with_and_without_prefix() {
        let id = RequestId::new();
        let parsed: RequestId = id.to_string().parse().expect("should parse");
        assert_eq!(id, parsed);

        let raw: RequestId = id.as_ulid().to_string().parse().expect("should parse");
        assert_eq!(id, raw);
    }

    #[test]
    fn parse_invalid_ulid() {
        let err = "req_nope".parse::<RequestId>().unwrap_err();
        assert_eq!(err.id_type, "RequestId");
    }
}
