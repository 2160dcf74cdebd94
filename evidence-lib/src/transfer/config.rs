//! Configuration for the transfer layer.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{EvidenceError, Result};

/// Endpoint pools and per-attempt limits.
///
/// ```json
/// {
///   "write_pool": ["https://pin-a.example/api/v0/add", "https://pin-b.example"],
///   "read_pool": ["https://gateway.example/ipfs"],
///   "timeout_secs": 20,
///   "shuffle": false
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Base URLs accepting uploads, tried in order.
    pub write_pool: Vec<String>,

    /// Base URLs serving `{base}/{handle}`, tried in order.
    pub read_pool: Vec<String>,

    /// Upper bound on each attempt in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Randomize pool order on every call.
    #[serde(default)]
    pub shuffle: bool,

    /// Bearer token sent with uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Path appended to write pool URLs for uploads.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub upload_path: String,
}

fn default_timeout() -> u64 {
    20
}

impl TransferConfig {
    /// Create a configuration with default limits.
    pub fn new(write_pool: Vec<String>, read_pool: Vec<String>) -> Self {
        Self {
            write_pool,
            read_pool,
            timeout_secs: default_timeout(),
            shuffle: false,
            auth_token: None,
            upload_path: String::new(),
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enable or disable pool shuffling.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set the upload bearer token.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the upload path, e.g. `/api/v0/add`.
    pub fn with_upload_path(mut self, path: impl Into<String>) -> Self {
        self.upload_path = path.into();
        self
    }

    /// The per-attempt timeout as a duration.
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject configurations the transfer layer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(EvidenceError::config("timeout_secs", "must be greater than zero"));
        }
        validate_pool("write_pool", &self.write_pool)?;
        validate_pool("read_pool", &self.read_pool)?;
        if !self.upload_path.is_empty() && !self.upload_path.starts_with('/') {
            return Err(EvidenceError::config("upload_path", "must start with '/'"));
        }
        if self.auth_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(EvidenceError::config("auth_token", "must not be blank"));
        }
        Ok(())
    }

    /// Parse a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EvidenceError::config(path.display().to_string(), format!("cannot read file: {e}"))
        })?;
        Self::from_json(&json)
    }
}

fn validate_pool(field: &str, pool: &[String]) -> Result<()> {
    if pool.is_empty() {
        return Err(EvidenceError::config(field, "at least one endpoint is required"));
    }
    for url in pool {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| EvidenceError::config(field, format!("{url:?} is not an http(s) URL")))?;
        if rest.is_empty() || rest.starts_with('/') {
            return Err(EvidenceError::config(field, format!("{url:?} has no host")));
        }
    }
    Ok(())
}
