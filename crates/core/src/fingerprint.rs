use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of a feed payload, base64-encoded with the URL-safe
/// alphabet (padded, 44 chars).
///
/// Two fingerprints are equal iff the encoded strings are byte-for-byte equal,
/// which is how a stored value is compared against a freshly computed one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest the exact payload bytes.
    pub fn of(payload: &[u8]) -> Self {
        let digest = Sha256::digest(payload);
        Self(URL_SAFE.encode(digest))
    }

    /// Wrap a previously persisted value. Surrounding whitespace is dropped;
    /// blank input yields `None`.
    pub fn from_stored(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `stored` is present and identical to this fingerprint.
    pub fn matches(&self, stored: Option<&Fingerprint>) -> bool {
        stored.is_some_and(|s| s == self)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
