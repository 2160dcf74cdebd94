//! HTTP storage endpoint.
//!
//! Uploads POST the raw blob as `application/octet-stream`; downloads GET
//! `{base}/{handle}`. A `409 Conflict` on upload means the content is already
//! stored and is accepted when its body carries a handle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::response::extract_handle;
use super::{AttemptError, StorageEndpoint};

/// One HTTP object store or gateway.
#[derive(Clone, Debug)]
pub struct HttpEndpoint {
    base_url: String,
    upload_path: String,
    auth_token: Option<String>,
    attempt_timeout: Duration,
    client: reqwest::Client,
}

impl HttpEndpoint {
    /// Create an endpoint for `base_url` using a shared client.
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            upload_path: String::new(),
            auth_token: None,
            attempt_timeout: Duration::from_secs(20),
            client,
        }
    }

    /// Set the path appended to the base URL for uploads.
    pub fn with_upload_path(mut self, path: impl Into<String>) -> Self {
        self.upload_path = path.into();
        self
    }

    /// Send `Authorization: Bearer <token>` with uploads.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Timeout reported when the client's own deadline fires.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn upload_url(&self) -> String {
        format!("{}{}", self.base_url, self.upload_path)
    }

    fn download_url(&self, handle: &str) -> String {
        format!("{}/{}", self.base_url, handle)
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> AttemptError {
        if e.is_timeout() {
            AttemptError::Timeout {
                endpoint: self.base_url.clone(),
                timeout_ms: self.attempt_timeout.as_millis() as u64,
            }
        } else {
            AttemptError::Transport {
                endpoint: self.base_url.clone(),
                reason: e.to_string(),
            }
        }
    }

    fn status_error(&self, status: StatusCode) -> AttemptError {
        AttemptError::Status {
            endpoint: self.base_url.clone(),
            status: status.as_u16(),
        }
    }
}

#[async_trait]
impl StorageEndpoint for HttpEndpoint {
    fn label(&self) -> &str {
        &self.base_url
    }

    async fn put(&self, blob: &[u8]) -> Result<String, AttemptError> {
        let mut request = self
            .client
            .post(self.upload_url())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(blob.to_vec());
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_reqwest_error(e))?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::CONFLICT {
            return Err(self.status_error(status));
        }

        let body = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?;
        match extract_handle(&body) {
            Some(handle) => Ok(handle),
            None if status == StatusCode::CONFLICT => Err(self.status_error(status)),
            None => Err(AttemptError::InvalidResponse {
                endpoint: self.base_url.clone(),
                reason: "no handle in upload response".to_string(),
            }),
        }
    }

    async fn get(&self, handle: &str) -> Result<Vec<u8>, AttemptError> {
        let response = self
            .client
            .get(self.download_url(handle))
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.status_error(status));
        }

        let body = response.bytes().await.map_err(|e| self.map_reqwest_error(e))?;
        Ok(body.to_vec())
    }
}
