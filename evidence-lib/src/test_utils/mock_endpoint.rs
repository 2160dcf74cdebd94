//! Scripted in-memory storage endpoints.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::fingerprint::fingerprint;
use crate::transfer::{AttemptError, StorageEndpoint};

/// How a [`MockEndpoint`] answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockBehavior {
    /// Store and serve blobs normally.
    Accept,
    /// Answer every request with this HTTP status.
    Fail(u16),
    /// Fail before any response, like a refused connection.
    Unreachable,
    /// Never answer.
    Hang,
    /// Accept uploads but report this handle instead of the real one.
    ReturnHandle(String),
    /// Serve stored blobs with their first byte flipped.
    Corrupt,
}

/// Object storage shared by every endpoint created from it.
///
/// Handles are the hex fingerprint of the stored bytes, so any endpoint can
/// serve what another endpoint stored.
#[derive(Clone, Default)]
pub struct MockStorageNetwork {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    call_log: Arc<Mutex<Vec<String>>>,
}

impl MockStorageNetwork {
    /// Create an empty network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint with the given behavior.
    pub fn endpoint(&self, label: &str, behavior: MockBehavior) -> Arc<MockEndpoint> {
        Arc::new(MockEndpoint {
            label: label.to_string(),
            behavior,
            attempts: AtomicUsize::new(0),
            network: self.clone(),
        })
    }

    /// Store bytes directly, bypassing any endpoint.
    pub fn insert(&self, blob: &[u8]) -> String {
        let handle = fingerprint(blob).to_hex();
        self.objects
            .lock()
            .unwrap()
            .insert(handle.clone(), blob.to_vec());
        handle
    }

    /// Overwrite the bytes stored under `handle`.
    pub fn replace(&self, handle: &str, blob: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(handle.to_string(), blob.to_vec());
    }

    /// Bytes stored under `handle`.
    pub fn get(&self, handle: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(handle).cloned()
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Labels of endpoints in the order they were called.
    pub fn call_log(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }
}

/// A storage endpoint with scripted behavior and an attempt counter.
pub struct MockEndpoint {
    label: String,
    behavior: MockBehavior,
    attempts: AtomicUsize,
    network: MockStorageNetwork,
}

impl MockEndpoint {
    /// Number of `put`/`get` calls received.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.network.call_log.lock().unwrap().push(self.label.clone());
    }

    fn status(&self, status: u16) -> AttemptError {
        AttemptError::Status {
            endpoint: self.label.clone(),
            status,
        }
    }

    fn unreachable(&self) -> AttemptError {
        AttemptError::Transport {
            endpoint: self.label.clone(),
            reason: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl StorageEndpoint for MockEndpoint {
    fn label(&self) -> &str {
        &self.label
    }

    async fn put(&self, blob: &[u8]) -> Result<String, AttemptError> {
        self.record_call();
        match &self.behavior {
            MockBehavior::Accept | MockBehavior::Corrupt => Ok(self.network.insert(blob)),
            MockBehavior::ReturnHandle(handle) => {
                self.network.insert(blob);
                Ok(handle.clone())
            }
            MockBehavior::Fail(status) => Err(self.status(*status)),
            MockBehavior::Unreachable => Err(self.unreachable()),
            MockBehavior::Hang => std::future::pending().await,
        }
    }

    async fn get(&self, handle: &str) -> Result<Vec<u8>, AttemptError> {
        self.record_call();
        match &self.behavior {
            MockBehavior::Fail(status) => return Err(self.status(*status)),
            MockBehavior::Unreachable => return Err(self.unreachable()),
            MockBehavior::Hang => return std::future::pending().await,
            MockBehavior::Accept | MockBehavior::ReturnHandle(_) | MockBehavior::Corrupt => {}
        }

        let mut blob = self.network.get(handle).ok_or_else(|| self.status(404))?;
        if self.behavior == MockBehavior::Corrupt {
            match blob.first_mut() {
                Some(first) => *first ^= 0x01,
                None => blob.push(0),
            }
        }
        Ok(blob)
    }
}
