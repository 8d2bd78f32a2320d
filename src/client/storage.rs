//! Object storage client for raw training data uploads.
//!
//! Speaks a plain S3-style path layout: `PUT <base>/<bucket>` creates a
//! bucket, `PUT <base>/<bucket>/<key>` stores an object, `HEAD` probes.
//! [`upload_file`] is the only entry point callers use; the put goes through
//! the Invoker, the bucket check does not.

use super::retry::Invoker;
use crate::models::{resolve_token, FlexionError, Result, StorageConfig};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// S3-style object store.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Whether the bucket exists. Exactly one network attempt.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create the bucket. Exactly one network attempt.
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    /// Store one object. Exactly one network attempt.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// reqwest-backed storage client.
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    token: Option<String>,
}

impl StorageClient {
    /// Build a client from config, resolving the bearer token eagerly.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let token = resolve_token("storage", &config.api_key, &config.api_key_env)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FlexionError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            token,
        })
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send_error(&self, e: reqwest::Error) -> FlexionError {
        if e.is_timeout() {
            FlexionError::Timeout(self.timeout)
        } else {
            FlexionError::Network(e)
        }
    }
}

#[async_trait]
impl ObjectStorage for StorageClient {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        let url = format!("{}/{bucket}", self.base_url);
        let request = self.authorized(self.http.head(&url));
        let response = request.send().await.map_err(|e| self.send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Err(FlexionError::Remote {
            status: status.as_u16(),
            message: format!("HEAD {bucket} failed"),
        })
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let url = format!("{}/{bucket}", self.base_url);
        debug!(bucket, "Creating bucket");
        let request = self.authorized(self.http.put(&url));
        let response = request.send().await.map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlexionError::Remote {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let url = format!("{}/{bucket}/{key}", self.base_url);
        let request = self
            .authorized(self.http.put(&url))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body);
        let response = request.send().await.map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FlexionError::Remote {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(())
    }
}

/// Upload a local file to `bucket/key`.
///
/// A missing local file is terminal before any network traffic. The bucket
/// is created if absent (single shot); only the object put is retried.
pub async fn upload_file(
    store: &dyn ObjectStorage,
    invoker: &Invoker,
    bucket: &str,
    path: &Path,
    key: &str,
) -> Result<String> {
    if !path.exists() {
        return Err(FlexionError::MissingFile(path.to_path_buf()));
    }
    let body = fs::read(path).map_err(|e| FlexionError::io("reading upload file", e))?;
    let bytes = body.len();
    info!(path = %path.display(), bucket, key, bytes, "Uploading training data");

    if !store.bucket_exists(bucket).await? {
        info!(bucket, "Bucket not found, creating it");
        store.create_bucket(bucket).await?;
    }

    invoker
        .run("storage upload", || {
            let body = body.clone();
            async move { store.put_object(bucket, key, body).await }
        })
        .await?;

    info!(bucket, key, bytes, "Upload complete");
    Ok(format!("{bucket}/{key}"))
}
