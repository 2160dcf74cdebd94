//! Content fingerprints.
//!
//! A fingerprint is the SHA-256 digest of the exact bytes handed to the
//! transfer layer, so for sealed evidence it covers the sealed blob and not
//! the plaintext. It is recorded externally as lowercase hex and recomputed
//! on every read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{EvidenceError, Result};

/// Digest length in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// SHA-256 digest of a stored blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse the hex form recorded externally.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let mut bytes = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(hex_str.trim(), &mut bytes).map_err(|e| {
            EvidenceError::invalid_data("fingerprint", format!("expected 64 hex characters: {e}"))
        })?;
        Ok(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Recompute over `blob` and compare byte-for-byte.
    pub fn matches(&self, blob: &[u8]) -> bool {
        fingerprint(blob) == *self
    }

    /// Like [`Fingerprint::matches`], but reports the mismatch as an error.
    pub fn verify(&self, blob: &[u8]) -> Result<()> {
        let actual = fingerprint(blob);
        if actual == *self {
            Ok(())
        } else {
            Err(EvidenceError::FingerprintMismatch {
                expected: self.to_hex(),
                actual: actual.to_hex(),
            })
        }
    }
}

/// Compute the fingerprint of `blob`.
pub fn fingerprint(blob: &[u8]) -> Fingerprint {
    Fingerprint(Sha256::digest(blob).into())
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = EvidenceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<Fingerprint> for String {
    fn from(fp: Fingerprint) -> Self {
        fp.to_hex()
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = EvidenceError;

    fn try_from(s: String) -> Result<Self> {
        Self::from_hex(&s)
    }
}
