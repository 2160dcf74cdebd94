//! End-to-end evidence pipeline.
//!
//! Archive: optionally seal for a recipient, fingerprint the exact bytes to be
//! stored, then store them with failover. Retrieve reverses it: fetch, check
//! the fetched bytes against the externally recorded fingerprint, and only
//! then unseal.
//!
//! The fingerprint and handle are meant to be recorded somewhere the storage
//! operators cannot rewrite; [`ProvenanceRegistry`] is that seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::fingerprint::{fingerprint, Fingerprint};
use crate::seal::{seal, unseal};
use crate::transfer::BlobTransport;
use crate::Result;

/// Outcome of archiving one artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchivedEvidence {
    /// Handle assigned by the storage endpoint.
    pub handle: String,
    /// Fingerprint of the stored bytes.
    pub fingerprint: Fingerprint,
    /// Whether the stored bytes are a sealed blob.
    pub sealed: bool,
    /// Size of the stored bytes.
    pub size_bytes: usize,
}

impl ArchivedEvidence {
    /// Build a provenance record stamped with the current time.
    pub fn provenance_record(&self, metadata: serde_json::Value) -> ProvenanceRecord {
        ProvenanceRecord {
            locator: self.handle.clone(),
            fingerprint_hex: self.fingerprint.to_hex(),
            timestamp: Utc::now(),
            sealed: self.sealed,
            size_bytes: self.size_bytes as u64,
            metadata,
        }
    }
}

/// Externally anchored proof that an artifact existed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// Storage handle.
    pub locator: String,
    /// Hex fingerprint of the stored bytes.
    pub fingerprint_hex: String,
    /// When the artifact was archived.
    pub timestamp: DateTime<Utc>,
    /// Whether the stored bytes are sealed.
    pub sealed: bool,
    /// Size of the stored bytes.
    pub size_bytes: u64,
    /// Caller-supplied context (case id, source label, ...).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl ProvenanceRecord {
    /// Parse the recorded fingerprint.
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        Fingerprint::from_hex(&self.fingerprint_hex)
    }
}

/// Destination for provenance records.
#[async_trait]
pub trait ProvenanceRegistry: Send + Sync {
    /// Record `record`, returning the registry's identifier for it.
    async fn record(&self, record: &ProvenanceRecord) -> Result<String>;
}

/// Seal, fingerprint and store evidence through a transport.
pub struct EvidenceVault<T> {
    transport: T,
}

impl<T: BlobTransport> EvidenceVault<T> {
    /// Create a vault over `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Store `payload`, sealed for `recipient` when one is given.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip_all, fields(size = payload.len(), sealed = recipient.is_some()))
    )]
    pub async fn archive(
        &self,
        payload: &[u8],
        recipient: Option<&RsaPublicKey>,
    ) -> Result<ArchivedEvidence> {
        let stored = match recipient {
            Some(key) => seal(payload, key)?,
            None => payload.to_vec(),
        };
        let fingerprint = fingerprint(&stored);
        let handle = self.transport.store_with_failover(&stored).await?;

        #[cfg(feature = "tracing")]
        tracing::info!(%handle, %fingerprint, size = stored.len(), "evidence archived");

        Ok(ArchivedEvidence {
            handle,
            fingerprint,
            sealed: recipient.is_some(),
            size_bytes: stored.len(),
        })
    }

    /// Fetch `handle`, check it against `expected`, and unseal if a key is given.
    ///
    /// Fails with [`crate::EvidenceError::FingerprintMismatch`] before any
    /// decryption is attempted when the fetched bytes differ.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, expected, recipient), fields(expected = %expected)))]
    pub async fn retrieve(
        &self,
        handle: &str,
        expected: &Fingerprint,
        recipient: Option<&RsaPrivateKey>,
    ) -> Result<Vec<u8>> {
        let fetched = self.transport.fetch_with_failover(handle).await?;
        expected.verify(&fetched)?;

        match recipient {
            Some(key) => unseal(&fetched, key),
            None => Ok(fetched),
        }
    }

    /// Archive `payload` and record its provenance.
    ///
    /// Returns the archive result and the registry's record identifier. If
    /// registration fails the blob stays stored and the registry error is
    /// returned.
    pub async fn archive_and_register<R>(
        &self,
        payload: &[u8],
        recipient: Option<&RsaPublicKey>,
        registry: &R,
        metadata: serde_json::Value,
    ) -> Result<(ArchivedEvidence, String)>
    where
        R: ProvenanceRegistry + ?Sized,
    {
        let archived = self.archive(payload, recipient).await?;
        let record = archived.provenance_record(metadata);
        let record_id = registry.record(&record).await?;
        Ok((archived, record_id))
    }
}
