//! Stable identifiers for command text.
//!
//! A [`Fingerprint`] keys both the job registry and the result cache. Only the
//! base command is hashed; argument keys never contribute.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of a command string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of `command`.
///
/// Pure and total: the same text always yields the same 64-character
/// lowercase hex digest.
#[must_use]
pub fn fingerprint(command: &str) -> Fingerprint {
    Fingerprint(format!("{:x}", Sha256::digest(command.as_bytes())))
}
