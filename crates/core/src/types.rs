//! Core identifier types
//!
//! This module defines the fundamental types used throughout the system:
//! - [`RecordId`]: Store-assigned identifier for a record
//! - [`Version`]: Opaque token naming one committed state of a record

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a stored record
///
/// Assigned by the store on `create` and immutable afterwards.
///
/// # Examples
///
/// ```
/// use occstore_core::types::RecordId;
///
/// let id = RecordId::new(7);
/// assert_eq!(id.as_u64(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// Wrap a raw identifier
    pub const fn new(raw: u64) -> Self {
        RecordId(raw)
    }

    /// Raw numeric value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        RecordId(raw)
    }
}

/// Opaque version token
///
/// Every committed mutation of a record gets a new token, and tokens are never
/// reused across committed states. Tokens compare for equality only: there is
/// deliberately no `Ord` implementation, callers must not reason about which of
/// two versions is "newer".
///
/// The decimal rendering (`Display` / `FromStr`) is stable so a transport
/// layer can ship it in an ETag-style header and hand it back unchanged.
///
/// # Examples
///
/// ```
/// use occstore_core::types::Version;
///
/// let v: Version = "42".parse().unwrap();
/// assert_eq!(v, Version::from_raw(42));
/// assert_eq!(v.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    /// Rebuild a token from its raw representation
    ///
    /// Only stores and transport decoders should call this.
    pub const fn from_raw(raw: u64) -> Self {
        Version(raw)
    }

    /// Raw representation, for storage backends and transports
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a version token cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version token: {0:?}")]
pub struct ParseVersionError(pub String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ETag values arrive quoted, optionally weak (W/"17")
        let trimmed = s.trim();
        let tag = trimmed.strip_prefix("W/").unwrap_or(trimmed);
        let token = match tag.strip_prefix('"') {
            Some(rest) => rest.strip_suffix('"'),
            None if tag.ends_with('"') || tag.len() != trimmed.len() => None,
            None => Some(tag),
        };
        token
            .filter(|t| !t.starts_with('+'))
            .and_then(|t| t.parse::<u64>().ok())
            .map(Version)
            .ok_or_else(|| ParseVersionError(s.to_string()))
    }
}

/// Timestamp type used for advisory record metadata
pub type Timestamp = chrono::DateTime<chrono::Utc>;
