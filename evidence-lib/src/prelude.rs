//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use evidence_lib::prelude::*;
//! ```
//!
//! ## What's Included
//!
//! - Error types: `EvidenceError`, `EvidenceErrorCode`, `Result`
//! - Keys: `KeyPair`, key generation, import and export
//! - Sealing and fingerprints: `seal`, `unseal`, `fingerprint`, `Fingerprint`
//! - Transfer: `BlobTransport`, `StorageEndpoint`, `FailoverTransfer`, `TransferConfig`
//! - Identity keys: `KeyStore`, `FileKeyStore`, `IdentityKeyManager`
//! - Pipeline: `EvidenceVault`, `ProvenanceRecord`, `ProvenanceRegistry`

// Error handling
pub use crate::errors::{EvidenceError, EvidenceErrorCode};
pub use crate::Result;

// Keys
pub use crate::keys::{
    export_private_key, export_public_key, generate_key_pair, import_private_key,
    import_public_key, KeyPair,
};
pub use crate::{RsaPrivateKey, RsaPublicKey};

// Sealing and fingerprints
pub use crate::fingerprint::{fingerprint, Fingerprint};
pub use crate::seal::{seal, seal_with_encoded_key, unseal};

// Transfer
pub use crate::transfer::{
    AttemptError, BlobTransport, FailoverTransfer, Operation, StorageEndpoint, TransferConfig,
};

#[cfg(feature = "http-transport")]
pub use crate::transfer::HttpEndpoint;

// Identity keys
pub use crate::key_store::{FileKeyStore, IdentityKeyManager, InMemoryKeyStore, KeyStore};

// Pipeline
pub use crate::vault::{ArchivedEvidence, EvidenceVault, ProvenanceRecord, ProvenanceRegistry};
