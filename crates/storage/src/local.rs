//! Local filesystem object store
//!
//! Buckets are directories under a base path; writes are atomic
//! (write to a temp name, then rename) so readers never observe a
//! partially-written blob.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};
use uploader_core::{Error, Result};
use uuid::Uuid;

use crate::ObjectStore;

/// Local filesystem object store
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    /// Directory holding one subdirectory per bucket
    base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, bucket: &str, path: &str) -> PathBuf {
        self.base_path.join(bucket).join(path)
    }

    async fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage {
                    message: format!("Failed to create directory {:?}: {}", parent, e),
                })?;
        }

        let temp_name = format!(
            ".{}.{}.tmp",
            target.file_name().unwrap_or_default().to_string_lossy(),
            Uuid::new_v4()
        );
        let temp_path = target.with_file_name(temp_name);

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Storage {
                message: format!("Failed to create temp file {:?}: {}", temp_path, e),
            })?;
        file.write_all(data).await.map_err(|e| Error::Storage {
            message: format!("Failed to write data: {}", e),
        })?;
        file.sync_all().await.map_err(|e| Error::Storage {
            message: format!("Failed to sync file: {}", e),
        })?;

        fs::rename(&temp_path, target)
            .await
            .map_err(|e| Error::Storage {
                message: format!("Failed to rename {:?} to {:?}: {}", temp_path, target, e),
            })
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    #[instrument(skip(self, data), fields(backend = "local", size = data.len()))]
    async fn put(&self, bucket: &str, path: &str, data: Bytes) -> Result<()> {
        let target = self.object_path(bucket, path);
        debug!(?target, "Writing blob atomically");
        self.write_atomic(&target, &data).await
    }

    #[instrument(skip(self), fields(backend = "local"))]
    async fn copy(
        &self,
        src_bucket: &str,
        src_path: &str,
        dst_bucket: &str,
        dst_path: &str,
    ) -> Result<()> {
        let source = self.object_path(src_bucket, src_path);
        let data = match fs::read(&source).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::StoragePathNotFound {
                    path: format!("{src_bucket}/{src_path}"),
                })
            }
            Err(e) => {
                return Err(Error::Storage {
                    message: format!("Failed to read {:?}: {}", source, e),
                })
            }
        };

        let target = self.object_path(dst_bucket, dst_path);
        debug!(?source, ?target, "Copying blob");
        self.write_atomic(&target, &data).await
    }
}
