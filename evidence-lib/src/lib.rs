//! Evidence library.
//!
//! Seals evidence for a designated recipient, fingerprints exactly what gets
//! stored, and moves blobs through a pool of interchangeable storage endpoints
//! that fail over to one another.
//!
//! # Features
//!
//! - **Hybrid sealing**: AES-256-GCM payload encryption with the per-blob key
//!   wrapped under the recipient's RSA-OAEP public key
//! - **Fingerprints**: SHA-256 over the stored bytes, for external anchoring
//! - **Failover transfer**: ordered, one-attempt-per-endpoint uploads and
//!   downloads with a mandatory per-attempt timeout
//! - **Identity keys**: pluggable key stores with a file-backed default
//!
//! # Cargo features
//!
//! - `http-transport` (default): [`transfer::HttpEndpoint`] and
//!   [`transfer::FailoverTransfer::from_config`] via `reqwest`
//! - `tracing`: spans and events on transfer and vault operations
//! - `test-utils`: mock endpoints and shared key fixtures
//!
//! # Example
//!
//! ```
//! use evidence_lib::{fingerprint, generate_key_pair, seal, unseal};
//!
//! let recipient = generate_key_pair()?;
//! let blob = seal(b"minutes of the 14 March board meeting", recipient.public_key())?;
//! let proof = fingerprint(&blob);
//!
//! // ... store `blob`, publish `proof` somewhere tamper-evident ...
//!
//! assert!(proof.matches(&blob));
//! assert_eq!(
//!     unseal(&blob, recipient.private_key())?,
//!     b"minutes of the 14 March board meeting"
//! );
//! # Ok::<(), evidence_lib::EvidenceError>(())
//! ```

pub mod errors;
pub mod fingerprint;
pub mod key_store;
pub mod keys;
pub mod prelude;
pub mod seal;
pub mod transfer;
pub mod vault;

/// Test utilities for evidence handling.
///
/// This module is only available with the `test-utils` feature or in test builds.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use errors::{EvidenceError, EvidenceErrorCode};
pub use fingerprint::{fingerprint, Fingerprint};
pub use keys::{
    export_private_key, export_public_key, generate_key_pair, import_private_key,
    import_public_key, KeyPair,
};
pub use seal::{seal, seal_with_encoded_key, unseal};
pub use transfer::{BlobTransport, FailoverTransfer, TransferConfig};
pub use vault::{ArchivedEvidence, EvidenceVault};

/// Re-exported so callers can name key types without depending on `rsa`.
pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Common result alias for evidence operations.
pub type Result<T> = std::result::Result<T, EvidenceError>;
