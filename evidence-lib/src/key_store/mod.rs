//! Persistence for recipient identity keys.
//!
//! Only private keys are persisted (PKCS#8, base64); public keys are always
//! derived. Two stores are provided:
//! - [`InMemoryKeyStore`] for tests and ephemeral sessions
//! - [`FileKeyStore`], one owner-only file per key in a directory
//!
//! [`IdentityKeyManager`] layers identity semantics on top of any store: a
//! key pair is created on first use and reused afterwards, and regeneration
//! is an explicit, destructive act since blobs sealed for the old public key
//! can no longer be opened.
//!
//! ```rust,ignore
//! use evidence_lib::key_store::{FileKeyStore, IdentityKeyManager};
//!
//! let manager = IdentityKeyManager::new(FileKeyStore::new("/var/lib/evidence/keys")?);
//! let pair = manager.load_or_create("newsroom").await?;
//! let shareable = manager.public_key_export("newsroom").await?;
//! ```

mod file;
mod memory;

pub use file::FileKeyStore;
pub use memory::InMemoryKeyStore;

use std::future::Future;

use zeroize::Zeroizing;

use crate::keys::{export_private_key, export_public_key, import_private_key, KeyPair};
use crate::{EvidenceError, Result};

/// Errors raised by key stores.
#[derive(Debug, thiserror::Error)]
pub enum KeyStoreError {
    /// No key is stored under the id.
    #[error("key not found: {0}")]
    NotFound(String),

    /// A key is already stored under the id and overwrite was not requested.
    #[error("key already exists: {0}")]
    AlreadyExists(String),

    /// The id contains characters the store cannot represent.
    #[error("invalid key id {0:?}")]
    InvalidKeyId(String),

    /// Filesystem failure.
    #[error("I/O error for key {key_id}: {source}")]
    Io {
        key_id: String,
        #[source]
        source: std::io::Error,
    },

    /// A previous holder of the lock panicked.
    #[error("key store lock poisoned during {0}")]
    LockPoisoned(&'static str),
}

impl KeyStoreError {
    /// Check if this error indicates the key wasn't found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for key store operations.
pub type KeyStoreResult<T> = std::result::Result<T, KeyStoreError>;

impl From<KeyStoreError> for EvidenceError {
    fn from(err: KeyStoreError) -> Self {
        EvidenceError::Storage(err.to_string())
    }
}

/// Options for storing a key.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    /// Overwrite if key already exists
    pub overwrite: bool,
}

impl StoreOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow overwriting existing keys.
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }
}

/// Check that `key_id` is safe to use as a file name.
///
/// Ids are limited to ASCII alphanumerics, `.`, `-` and `_`, must not start
/// with `.`, and are at most 128 characters long.
pub fn is_valid_key_id(key_id: &str) -> bool {
    !key_id.is_empty()
        && key_id.len() <= 128
        && !key_id.starts_with('.')
        && key_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Storage for secret key material.
///
/// Implementations must never log key material.
pub trait KeyStore: Send + Sync {
    /// Store `key_data` under `key_id`.
    ///
    /// # Errors
    /// - `AlreadyExists` if a key exists and `options.overwrite` is false
    /// - `InvalidKeyId` if the id fails [`is_valid_key_id`]
    fn store(
        &self,
        key_id: &str,
        key_data: &[u8],
        options: StoreOptions,
    ) -> impl Future<Output = KeyStoreResult<()>> + Send;

    /// Retrieve a key, or `None` if nothing is stored under `key_id`.
    fn retrieve(
        &self,
        key_id: &str,
    ) -> impl Future<Output = KeyStoreResult<Option<Zeroizing<Vec<u8>>>>> + Send;

    /// Delete a key.
    ///
    /// # Errors
    /// - `NotFound` if the key doesn't exist
    fn delete(&self, key_id: &str) -> impl Future<Output = KeyStoreResult<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key_id: &str) -> impl Future<Output = KeyStoreResult<bool>> + Send;

    /// List all stored key ids, sorted.
    fn list_keys(&self) -> impl Future<Output = KeyStoreResult<Vec<String>>> + Send;
}

const IDENTITY_PREFIX: &str = "identity.";
const PRIVATE_SUFFIX: &str = ".private";

/// Recipient identities backed by a [`KeyStore`].
pub struct IdentityKeyManager<S> {
    store: S,
}

impl<S: KeyStore> IdentityKeyManager<S> {
    /// Wrap a key store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store id under which an identity's private key lives.
    pub fn key_id(identity: &str) -> Result<String> {
        let key_id = format!("{IDENTITY_PREFIX}{identity}{PRIVATE_SUFFIX}");
        if identity.is_empty() || !is_valid_key_id(&key_id) {
            return Err(EvidenceError::invalid_data(
                "identity",
                "use letters, digits, '.', '-' or '_'",
            ));
        }
        Ok(key_id)
    }

    /// Load the identity's key pair, if one exists.
    ///
    /// A blank stored key, as left by an interrupted write, counts
    /// as no key.
    pub async fn load(&self, identity: &str) -> Result<Option<KeyPair>> {
        let key_id = Self::key_id(identity)?;
        match self.stored_key(&key_id).await? {
            StoredKey::Present(stored) => decode_key_pair(&key_id, &stored).map(Some),
            StoredKey::Missing | StoredKey::Blank => Ok(None),
        }
    }

    /// Load the identity's key pair, generating and persisting one on first use.
    ///
    /// A blank stored key is replaced. Any other undecodable key is an error
    /// and is left untouched.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn load_or_create(&self, identity: &str) -> Result<KeyPair> {
        let key_id = Self::key_id(identity)?;
        let options = match self.stored_key(&key_id).await? {
            StoredKey::Present(stored) => return decode_key_pair(&key_id, &stored),
            StoredKey::Blank => {
                #[cfg(feature = "tracing")]
                tracing::warn!(identity, "replacing blank identity key");
                StoreOptions::new().overwrite()
            }
            StoredKey::Missing => StoreOptions::new(),
        };

        let pair = KeyPair::generate()?;
        match self.persist(identity, &pair, options).await {
            Ok(()) => {
                #[cfg(feature = "tracing")]
                tracing::info!(identity, "generated identity key pair");
                Ok(pair)
            }
            // Lost a creation race; the stored key wins.
            Err(err) => match self.load(identity).await? {
                Some(existing) => Ok(existing),
                None => Err(err),
            },
        }
    }

    /// Replace the identity's key pair with a fresh one.
    ///
    /// Blobs sealed for the previous public key become unopenable.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn regenerate(&self, identity: &str) -> Result<KeyPair> {
        let pair = KeyPair::generate()?;
        self.persist(identity, &pair, StoreOptions::new().overwrite())
            .await?;
        #[cfg(feature = "tracing")]
        tracing::warn!(identity, "identity key pair regenerated");
        Ok(pair)
    }

    /// Exported public key for the identity, creating the identity if needed.
    pub async fn public_key_export(&self, identity: &str) -> Result<String> {
        let pair = self.load_or_create(identity).await?;
        export_public_key(pair.public_key())
    }

    /// Remove the identity. Returns `false` if it did not exist.
    pub async fn delete(&self, identity: &str) -> Result<bool> {
        let key_id = Self::key_id(identity)?;
        match self.store.delete(&key_id).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of all stored identities.
    pub async fn identities(&self) -> Result<Vec<String>> {
        let keys = self.store.list_keys().await?;
        Ok(keys
            .iter()
            .filter_map(|id| id.strip_prefix(IDENTITY_PREFIX)?.strip_suffix(PRIVATE_SUFFIX))
            .map(str::to_string)
            .collect())
    }

    async fn stored_key(&self, key_id: &str) -> Result<StoredKey> {
        Ok(match self.store.retrieve(key_id).await? {
            None => StoredKey::Missing,
            Some(stored) if stored.iter().all(u8::is_ascii_whitespace) => StoredKey::Blank,
            Some(stored) => StoredKey::Present(stored),
        })
    }

    async fn persist(&self, identity: &str, pair: &KeyPair, options: StoreOptions) -> Result<()> {
        let key_id = Self::key_id(identity)?;
        let encoded = export_private_key(pair.private_key())?;
        self.store
            .store(&key_id, encoded.as_bytes(), options)
            .await?;
        Ok(())
    }
}

enum StoredKey {
    Missing,
    Blank,
    Present(Zeroizing<Vec<u8>>),
}

fn decode_key_pair(key_id: &str, stored: &[u8]) -> Result<KeyPair> {
    let encoded = std::str::from_utf8(stored)
        .map_err(|_| EvidenceError::key_format(format!("stored key {key_id} is not text")))?;
    Ok(KeyPair::from_private_key(import_private_key(encoded)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id_validation() {
        assert!(is_valid_key_id("identity.alice.private"));
        assert!(is_valid_key_id("a-b_c.1"));
        assert!(!is_valid_key_id(""));
        assert!(!is_valid_key_id(".hidden"));
        assert!(!is_valid_key_id("../escape"));
        assert!(!is_valid_key_id("with space"));
        assert!(!is_valid_key_id(&"k".repeat(129)));
    }

    #[test]
    fn test_identity_key_id() {
        assert_eq!(
            IdentityKeyManager::<InMemoryKeyStore>::key_id("alice").unwrap(),
            "identity.alice.private"
        );
        assert!(IdentityKeyManager::<InMemoryKeyStore>::key_id("").is_err());
        assert!(IdentityKeyManager::<InMemoryKeyStore>::key_id("a/b").is_err());
    }

    #[tokio::test]
    async fn test_load_or_create_is_stable() {
        let manager = IdentityKeyManager::new(InMemoryKeyStore::new());
        assert!(manager.load("desk").await.unwrap().is_none());

        let first = manager.load_or_create("desk").await.unwrap();
        let second = manager.load_or_create("desk").await.unwrap();
        assert_eq!(first.public_key(), second.public_key());
        assert_eq!(manager.identities().await.unwrap(), vec!["desk"]);
    }

    #[tokio::test]
    async fn test_regenerate_replaces_key() {
        let manager = IdentityKeyManager::new(InMemoryKeyStore::new());
        let old = manager.load_or_create("desk").await.unwrap();
        let new = manager.regenerate("desk").await.unwrap();

        assert_ne!(old.public_key(), new.public_key());
        let loaded = manager.load("desk").await.unwrap().unwrap();
        assert_eq!(loaded.public_key(), new.public_key());
    }

    #[tokio::test]
    async fn test_public_key_export_and_delete() {
        let manager = IdentityKeyManager::new(InMemoryKeyStore::new());
        let exported = manager.public_key_export("desk").await.unwrap();
        let pair = manager.load("desk").await.unwrap().unwrap();
        assert_eq!(exported, export_public_key(pair.public_key()).unwrap());

        assert!(manager.delete("desk").await.unwrap());
        assert!(!manager.delete("desk").await.unwrap());
        assert!(manager.load("desk").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_stored_key() {
        let store = InMemoryKeyStore::new();
        store
            .store("identity.desk.private", b"garbage", StoreOptions::new())
            .await
            .unwrap();
        let manager = IdentityKeyManager::new(store);
        assert!(matches!(
            manager.load("desk").await,
            Err(EvidenceError::KeyFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_blank_stored_key_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("identity.desk.private.key"), b"").unwrap();
        let manager = IdentityKeyManager::new(FileKeyStore::new(dir.path()).unwrap());

        assert!(manager.load("desk").await.unwrap().is_none());
        let created = manager.load_or_create("desk").await.unwrap();
        let again = manager.load_or_create("desk").await.unwrap();
        assert_eq!(created.public_key(), again.public_key());

        let reopened = IdentityKeyManager::new(FileKeyStore::new(dir.path()).unwrap());
        let loaded = reopened.load("desk").await.unwrap().unwrap();
        assert_eq!(loaded.public_key(), created.public_key());
    }

    #[tokio::test]
    async fn test_corrupt_key_is_not_replaced() {
        let store = InMemoryKeyStore::new();
        store
            .store("identity.desk.private", b"MIIEv", StoreOptions::new())
            .await
            .unwrap();
        let manager = IdentityKeyManager::new(store);

        assert!(matches!(
            manager.load_or_create("desk").await,
            Err(EvidenceError::KeyFormat(_))
        ));
        let kept = manager.store().retrieve("identity.desk.private").await.unwrap().unwrap();
        assert_eq!(kept.as_slice(), b"MIIEv");
    }

    #[test]
    fn test_store_error_conversion() {
        let err: EvidenceError = KeyStoreError::NotFound("k".into()).into();
        assert!(matches!(err, EvidenceError::Storage(ref msg) if msg.contains("k")));
    }
}
