//! Resilient blob transfer across a pool of storage endpoints.
//!
//! Writes and reads each walk an ordered pool of interchangeable endpoints,
//! making exactly one attempt per endpoint and stopping at the first success.
//! Individual failures (bad status, transport error, timeout, unparseable
//! response) are logged and absorbed; only when every endpoint has been tried
//! does the caller see [`EvidenceError::AllEndpointsExhausted`].
//!
//! Attempts are strictly sequential, so at most one write is ever in flight
//! for a given call. Failover is lateral only: an endpoint that failed is
//! not retried within the same call.
//!
//! # Example
//!
//! ```rust,ignore
//! use evidence_lib::transfer::{BlobTransport, FailoverTransfer, TransferConfig};
//!
//! let config = TransferConfig::new(
//!     vec!["https://upload-a.example".into(), "https://upload-b.example".into()],
//!     vec!["https://gateway.example/ipfs".into()],
//! );
//! let transfer = FailoverTransfer::from_config(&config)?;
//!
//! let handle = transfer.store_with_failover(&blob).await?;
//! let bytes = transfer.fetch_with_failover(&handle).await?;
//! ```

mod config;
mod response;

#[cfg(feature = "http-transport")]
mod http;

pub use config::TransferConfig;
pub use response::{extract_handle, is_valid_handle};

#[cfg(feature = "http-transport")]
pub use http::HttpEndpoint;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::{EvidenceError, Result};

/// Which pool an operation runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Upload to the write pool.
    Write,
    /// Download from the read pool.
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => f.write_str("write"),
            Self::Read => f.write_str("read"),
        }
    }
}

/// Failure of a single attempt against a single endpoint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    /// The attempt did not finish within the per-attempt timeout.
    #[error("{endpoint}: timed out after {timeout_ms} ms")]
    Timeout { endpoint: String, timeout_ms: u64 },

    /// The endpoint answered with a non-success status.
    #[error("{endpoint}: HTTP {status}")]
    Status { endpoint: String, status: u16 },

    /// The request never produced a response.
    #[error("{endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// A success status whose body could not be used.
    #[error("{endpoint}: invalid response: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl AttemptError {
    /// Label of the endpoint that failed.
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Timeout { endpoint, .. }
            | Self::Status { endpoint, .. }
            | Self::Transport { endpoint, .. }
            | Self::InvalidResponse { endpoint, .. } => endpoint,
        }
    }
}

/// A single remote object store.
///
/// Implementations perform exactly one request per call and report failure
/// as an [`AttemptError`]; retrying is the caller's concern.
#[async_trait]
pub trait StorageEndpoint: Send + Sync {
    /// Human-readable identifier, usually the base URL.
    fn label(&self) -> &str;

    /// Upload `blob` and return the handle the endpoint assigned to it.
    async fn put(&self, blob: &[u8]) -> std::result::Result<String, AttemptError>;

    /// Download the blob stored under `handle`.
    async fn get(&self, handle: &str) -> std::result::Result<Vec<u8>, AttemptError>;
}

/// Store and fetch opaque blobs by handle.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Upload `blob`, returning its handle.
    async fn store_with_failover(&self, blob: &[u8]) -> Result<String>;

    /// Download the blob stored under `handle`.
    async fn fetch_with_failover(&self, handle: &str) -> Result<Vec<u8>>;
}

/// Ordered failover over a write pool and a read pool.
#[derive(Clone)]
pub struct FailoverTransfer {
    write_pool: Vec<Arc<dyn StorageEndpoint>>,
    read_pool: Vec<Arc<dyn StorageEndpoint>>,
    attempt_timeout: Duration,
    shuffle: bool,
}

impl FailoverTransfer {
    /// Create a transfer client over explicit endpoints.
    ///
    /// Fails with a configuration error if `attempt_timeout` is zero.
    pub fn new(
        write_pool: Vec<Arc<dyn StorageEndpoint>>,
        read_pool: Vec<Arc<dyn StorageEndpoint>>,
        attempt_timeout: Duration,
    ) -> Result<Self> {
        if attempt_timeout.is_zero() {
            return Err(EvidenceError::config(
                "timeout_secs",
                "per-attempt timeout must be positive",
            ));
        }
        Ok(Self {
            write_pool,
            read_pool,
            attempt_timeout,
            shuffle: false,
        })
    }

    /// Randomize pool order on every call.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build HTTP endpoints for every URL in `config`, sharing one client.
    #[cfg(feature = "http-transport")]
    pub fn from_config(config: &TransferConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.attempt_timeout())
            .build()
            .map_err(|e| {
                EvidenceError::config("http_client", format!("failed to build HTTP client: {e}"))
            })?;
        Self::from_config_with_client(config, client)
    }

    /// Like [`FailoverTransfer::from_config`], with a caller-supplied client.
    #[cfg(feature = "http-transport")]
    pub fn from_config_with_client(config: &TransferConfig, client: reqwest::Client) -> Result<Self> {
        config.validate()?;

        let write_pool = config
            .write_pool
            .iter()
            .map(|url| {
                let mut endpoint = HttpEndpoint::new(url.clone(), client.clone())
                    .with_attempt_timeout(config.attempt_timeout())
                    .with_upload_path(config.upload_path.clone());
                if let Some(token) = &config.auth_token {
                    endpoint = endpoint.with_auth_token(token.clone());
                }
                Arc::new(endpoint) as Arc<dyn StorageEndpoint>
            })
            .collect();

        let read_pool = config
            .read_pool
            .iter()
            .map(|url| {
                Arc::new(
                    HttpEndpoint::new(url.clone(), client.clone())
                        .with_attempt_timeout(config.attempt_timeout()),
                ) as Arc<dyn StorageEndpoint>
            })
            .collect();

        Ok(Self::new(write_pool, read_pool, config.attempt_timeout())?.with_shuffle(config.shuffle))
    }

    /// Endpoints tried on writes, in configured order.
    pub fn write_pool(&self) -> &[Arc<dyn StorageEndpoint>] {
        &self.write_pool
    }

    /// Endpoints tried on reads, in configured order.
    pub fn read_pool(&self) -> &[Arc<dyn StorageEndpoint>] {
        &self.read_pool
    }

    /// Upper bound on each individual attempt.
    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    fn attempt_order(&self, pool: &[Arc<dyn StorageEndpoint>]) -> Vec<Arc<dyn StorageEndpoint>> {
        let mut order = pool.to_vec();
        if self.shuffle {
            order.shuffle(&mut rand::thread_rng());
        }
        order
    }

    async fn run_pool<T, F, Fut>(
        &self,
        operation: Operation,
        pool: &[Arc<dyn StorageEndpoint>],
        attempt: F,
    ) -> Result<T>
    where
        F: Fn(Arc<dyn StorageEndpoint>) -> Fut,
        Fut: Future<Output = std::result::Result<T, AttemptError>>,
    {
        let order = self.attempt_order(pool);
        let attempts = order.len();
        let mut last_error = None;

        for endpoint in order {
            let label = endpoint.label().to_string();
            let outcome = match tokio::time::timeout(self.attempt_timeout, attempt(endpoint)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(AttemptError::Timeout {
                    endpoint: label.clone(),
                    timeout_ms: self.attempt_timeout.as_millis() as u64,
                }),
            };

            match outcome {
                Ok(value) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%operation, endpoint = %label, "attempt succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%operation, endpoint = %label, error = %err, "attempt failed, trying next endpoint");
                    last_error = Some(err);
                }
            }
        }

        Err(EvidenceError::AllEndpointsExhausted {
            operation,
            attempts,
            last_error,
        })
    }
}

#[async_trait]
impl BlobTransport for FailoverTransfer {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, blob), fields(size = blob.len())))]
    async fn store_with_failover(&self, blob: &[u8]) -> Result<String> {
        self.run_pool(Operation::Write, &self.write_pool, |endpoint| async move {
            let handle = endpoint.put(blob).await?;
            if !is_valid_handle(&handle) {
                return Err(AttemptError::InvalidResponse {
                    endpoint: endpoint.label().to_string(),
                    reason: format!("unusable handle {handle:?}"),
                });
            }
            Ok(handle)
        })
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    async fn fetch_with_failover(&self, handle: &str) -> Result<Vec<u8>> {
        if !is_valid_handle(handle) {
            return Err(EvidenceError::invalid_data(
                "handle",
                "must be a single non-empty path segment",
            ));
        }
        self.run_pool(Operation::Read, &self.read_pool, |endpoint| async move {
            endpoint.get(handle).await
        })
        .await
    }
}

impl fmt::Debug for FailoverTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = |pool: &[Arc<dyn StorageEndpoint>]| {
            pool.iter().map(|e| e.label().to_string()).collect::<Vec<_>>()
        };
        f.debug_struct("FailoverTransfer")
            .field("write_pool", &labels(&self.write_pool))
            .field("read_pool", &labels(&self.read_pool))
            .field("attempt_timeout", &self.attempt_timeout)
            .field("shuffle", &self.shuffle)
            .finish()
    }
}
