//! Object-store trait definition
//!
//! Defines the async interface the blob senders upload through.

use async_trait::async_trait;
use bytes::Bytes;
use uploader_core::Result;

/// Async trait for object-storage backends
///
/// The uploader only ever puts new objects and copies existing ones;
/// it never reads back or deletes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path` within `bucket`
    ///
    /// # Errors
    /// Returns error if the write fails; partially-written objects must
    /// not become visible.
    async fn put(&self, bucket: &str, path: &str, data: Bytes) -> Result<()>;

    /// Server-side copy of an existing object between buckets
    ///
    /// Used for profile files that already live in cloud storage, so the
    /// bytes never travel through the uploader.
    ///
    /// # Errors
    /// Returns `StoragePathNotFound` if the source object is missing.
    async fn copy(
        &self,
        src_bucket: &str,
        src_path: &str,
        dst_bucket: &str,
        dst_path: &str,
    ) -> Result<()>;
}

/// Deterministic object path for an uploaded blob:
/// `[<folder>/]tensorboard-<T>/<E>/<R>/<TS>/<blob-id>` built from the
/// final path segments of the respective resource names.
pub fn blob_object_path(
    folder: Option<&str>,
    tensorboard_id: &str,
    experiment_id: &str,
    run_id: &str,
    time_series_id: &str,
    blob_id: &str,
) -> String {
    let base = format!(
        "tensorboard-{tensorboard_id}/{experiment_id}/{run_id}/{time_series_id}/{blob_id}"
    );
    match folder {
        Some(folder) if !folder.is_empty() => {
            format!("{}/{}", folder.trim_end_matches('/'), base)
        }
        _ => base,
    }
}
