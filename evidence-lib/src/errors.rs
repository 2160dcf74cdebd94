//! Error types for evidence operations.
//!
//! Callers receive a small closed set of error kinds, enough to decide
//! between "ask for a different key", "re-encrypt/re-upload" and
//! "try again later". Cryptographic failures are never retried; transfer
//! failures are retried laterally inside the transfer layer and only the
//! terminal [`EvidenceError::AllEndpointsExhausted`] reaches the caller.

use std::fmt;

use crate::transfer::{AttemptError, Operation};

/// Numeric error codes.
///
/// Values are stable across releases so callers and log pipelines can match
/// on them instead of on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum EvidenceErrorCode {
    /// Malformed key encoding
    KeyFormat = 1000,
    /// Cryptographic primitive unavailable or misconfigured
    CryptoBackend = 1001,
    /// Wrong key or tampered blob
    DecryptionFailed = 2000,
    /// Stored bytes do not match the recorded fingerprint
    FingerprintMismatch = 2001,
    /// A single endpoint attempt failed
    EndpointAttemptFailed = 3000,
    /// Every endpoint in the pool failed
    AllEndpointsExhausted = 3001,
    /// Invalid request/data
    InvalidData = 5000,
    /// Serialization error
    Serialization = 5002,
    /// Invalid configuration
    Config = 6000,
    /// Key store error
    Storage = 7000,
}

/// Error type for sealing, fingerprinting and transfer operations.
#[derive(Debug)]
pub enum EvidenceError {
    /// A key could not be parsed from its text encoding.
    KeyFormat(String),

    /// An underlying cryptographic primitive failed.
    CryptoBackend(String),

    /// The blob could not be opened with the supplied key.
    ///
    /// Deliberately carries no detail: wrong key, truncation and tampering
    /// are indistinguishable to the caller.
    DecryptionFailed,

    /// The fetched bytes hash to a different fingerprint than the one recorded.
    FingerprintMismatch {
        /// Externally recorded fingerprint (hex)
        expected: String,
        /// Fingerprint of the fetched bytes (hex)
        actual: String,
    },

    /// One endpoint attempt failed. The failover loop consumes these and
    /// never returns one from a pool operation.
    EndpointAttemptFailed(AttemptError),

    /// Every endpoint in the pool was tried once and none succeeded.
    AllEndpointsExhausted {
        /// Which pool operation failed
        operation: Operation,
        /// Number of endpoints attempted
        attempts: usize,
        /// Error from the final attempt, if any attempt was made
        last_error: Option<AttemptError>,
    },

    /// Invalid data provided.
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Serialization/deserialization error.
    Serialization(String),

    /// Invalid configuration.
    Config {
        /// Offending configuration field
        field: String,
        /// Reason for rejection
        reason: String,
    },

    /// Key store operation failed.
    Storage(String),
}

impl EvidenceError {
    /// Stable numeric code for this error.
    pub fn code(&self) -> EvidenceErrorCode {
        match self {
            Self::KeyFormat(_) => EvidenceErrorCode::KeyFormat,
            Self::CryptoBackend(_) => EvidenceErrorCode::CryptoBackend,
            Self::DecryptionFailed => EvidenceErrorCode::DecryptionFailed,
            Self::FingerprintMismatch { .. } => EvidenceErrorCode::FingerprintMismatch,
            Self::EndpointAttemptFailed(_) => EvidenceErrorCode::EndpointAttemptFailed,
            Self::AllEndpointsExhausted { .. } => EvidenceErrorCode::AllEndpointsExhausted,
            Self::InvalidData { .. } => EvidenceErrorCode::InvalidData,
            Self::Serialization(_) => EvidenceErrorCode::Serialization,
            Self::Config { .. } => EvidenceErrorCode::Config,
            Self::Storage(_) => EvidenceErrorCode::Storage,
        }
    }

    /// Returns true if repeating the whole operation later may succeed.
    ///
    /// Cryptographic outcomes are deterministic for a given key and blob, so
    /// only exhausted transfer pools qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AllEndpointsExhausted { .. } | Self::EndpointAttemptFailed(_)
        )
    }

    /// Create a key format error.
    pub fn key_format(reason: impl Into<String>) -> Self {
        Self::KeyFormat(reason.into())
    }

    /// Create a crypto backend error.
    pub fn crypto_backend(reason: impl Into<String>) -> Self {
        Self::CryptoBackend(reason.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for EvidenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFormat(msg) => write!(f, "invalid key encoding: {}", msg),
            Self::CryptoBackend(msg) => write!(f, "crypto backend error: {}", msg),
            Self::DecryptionFailed => {
                write!(f, "decryption failed: not your evidence or corrupted")
            }
            Self::FingerprintMismatch { expected, actual } => {
                write!(
                    f,
                    "fingerprint mismatch: expected {}, fetched {}",
                    expected, actual
                )
            }
            Self::EndpointAttemptFailed(err) => write!(f, "endpoint attempt failed: {}", err),
            Self::AllEndpointsExhausted {
                operation,
                attempts,
                last_error,
            } => {
                write!(f, "{} failed on all {} endpoints", operation, attempts)?;
                if let Some(err) = last_error {
                    write!(f, " (last error: {})", err)?;
                }
                Ok(())
            }
            Self::InvalidData { field, reason } => write!(f, "invalid {}: {}", field, reason),
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::Config { field, reason } => {
                write!(f, "invalid configuration {}: {}", field, reason)
            }
            Self::Storage(msg) => write!(f, "key store error: {}", msg),
        }
    }
}

impl std::error::Error for EvidenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::EndpointAttemptFailed(err) => Some(err),
            Self::AllEndpointsExhausted {
                last_error: Some(err),
                ..
            } => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EvidenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<AttemptError> for EvidenceError {
    fn from(err: AttemptError) -> Self {
        Self::EndpointAttemptFailed(err)
    }
}
