//! S3 object store
//!
//! Backs blob uploads with Amazon S3 or an S3-compatible service
//! (MinIO, LocalStack). Transient failures are retried with exponential
//! backoff; profile files already in cloud storage are moved with
//! server-side copies.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{config::Builder as S3ConfigBuilder, primitives::ByteStream, Client};
use bytes::Bytes;
use tracing::{debug, instrument, warn};
use uploader_core::{Error, Result};

use crate::ObjectStore;

/// Maximum retry attempts for transient failures
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 100;

/// S3-compatible object store
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

/// Configuration for S3ObjectStore
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Optional custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: Option<String>,
    /// Force path-style addressing (required for MinIO)
    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            region: Some("us-east-1".to_string()),
            force_path_style: false,
        }
    }
}

impl S3ObjectStore {
    /// Create a store with default AWS configuration
    ///
    /// Uses environment variables or instance profile for credentials.
    pub async fn new() -> Self {
        Self::with_config(S3Config::default()).await
    }

    /// Create a store with custom configuration
    pub async fn with_config(config: S3Config) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(
                config.region.unwrap_or_else(|| "us-east-1".to_string()),
            ))
            .load()
            .await;

        let mut builder = S3ConfigBuilder::from(&aws_config);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Execute an async operation with exponential backoff retry
    async fn with_retry<T, F, Fut>(&self, operation: &str, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_retryable() {
                        return Err(e);
                    }

                    let delay = Duration::from_millis(BASE_RETRY_DELAY_MS * (1 << attempt));
                    warn!(
                        %operation,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Storage {
            message: format!("{} failed after {} retries", operation, MAX_RETRIES),
        }))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, data), fields(backend = "s3", size = data.len()))]
    async fn put(&self, bucket: &str, path: &str, data: Bytes) -> Result<()> {
        debug!(bucket, path, "Writing blob to S3");

        self.with_retry("put", || {
            let data = data.clone();
            async move {
                self.client
                    .put_object()
                    .bucket(bucket)
                    .key(path)
                    .body(ByteStream::from(data.to_vec()))
                    .send()
                    .await
                    .map_err(|e| Error::Storage {
                        message: format!("S3 put_object failed: {}", e),
                    })?;
                Ok(())
            }
        })
        .await
    }

    #[instrument(skip(self), fields(backend = "s3"))]
    async fn copy(
        &self,
        src_bucket: &str,
        src_path: &str,
        dst_bucket: &str,
        dst_path: &str,
    ) -> Result<()> {
        debug!(src_bucket, src_path, dst_bucket, dst_path, "Copying blob in S3");

        self.with_retry("copy", || async {
            self.client
                .copy_object()
                .copy_source(format!("{src_bucket}/{src_path}"))
                .bucket(dst_bucket)
                .key(dst_path)
                .send()
                .await
                .map_err(|e| {
                    if e.to_string().contains("NoSuchKey") {
                        Error::StoragePathNotFound {
                            path: format!("{src_bucket}/{src_path}"),
                        }
                    } else {
                        Error::Storage {
                            message: format!("S3 copy_object failed: {}", e),
                        }
                    }
                })?;
            Ok(())
        })
        .await
    }
}
