//! In-memory key store.
//!
//! Keys are lost when the process exits. Lock poisoning is reported as an
//! error rather than panicking.

use std::collections::HashMap;
use std::sync::RwLock;

use zeroize::Zeroizing;

use super::{is_valid_key_id, KeyStore, KeyStoreError, KeyStoreResult, StoreOptions};

/// Key store backed by a map.
#[derive(Default)]
pub struct InMemoryKeyStore {
    keys: RwLock<HashMap<String, Zeroizing<Vec<u8>>>>,
}

fn lock_error(context: &'static str) -> KeyStoreError {
    KeyStoreError::LockPoisoned(context)
}

impl InMemoryKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys. Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.keys.read().map(|k| k.len()).unwrap_or(0)
    }

    /// Check if the store is empty. Returns true if the lock is poisoned.
    pub fn is_empty(&self) -> bool {
        self.keys.read().map(|k| k.is_empty()).unwrap_or(true)
    }
}

impl KeyStore for InMemoryKeyStore {
    async fn store(&self, key_id: &str, key_data: &[u8], options: StoreOptions) -> KeyStoreResult<()> {
        if !is_valid_key_id(key_id) {
            return Err(KeyStoreError::InvalidKeyId(key_id.to_string()));
        }
        let mut keys = self.keys.write().map_err(|_| lock_error("store"))?;

        if keys.contains_key(key_id) && !options.overwrite {
            return Err(KeyStoreError::AlreadyExists(key_id.to_string()));
        }
        keys.insert(key_id.to_string(), Zeroizing::new(key_data.to_vec()));
        Ok(())
    }

    async fn retrieve(&self, key_id: &str) -> KeyStoreResult<Option<Zeroizing<Vec<u8>>>> {
        let keys = self.keys.read().map_err(|_| lock_error("retrieve"))?;
        Ok(keys.get(key_id).cloned())
    }

    async fn delete(&self, key_id: &str) -> KeyStoreResult<()> {
        let mut keys = self.keys.write().map_err(|_| lock_error("delete"))?;
        keys.remove(key_id)
            .map(|_| ())
            .ok_or_else(|| KeyStoreError::NotFound(key_id.to_string()))
    }

    async fn exists(&self, key_id: &str) -> KeyStoreResult<bool> {
        let keys = self.keys.read().map_err(|_| lock_error("exists"))?;
        Ok(keys.contains_key(key_id))
    }

    async fn list_keys(&self) -> KeyStoreResult<Vec<String>> {
        let keys = self.keys.read().map_err(|_| lock_error("list_keys"))?;
        let mut ids: Vec<String> = keys.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
