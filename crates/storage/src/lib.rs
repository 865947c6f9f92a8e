//! Storage - Object-storage backends for blob payloads
//!
//! Large payloads (serialized graphs, encoded images, profile files) go to
//! object storage; the metadata service only ever sees the blob id.
//! Supports:
//! - Local filesystem buckets (default feature, also backs `--dry-run`)
//! - Amazon S3 / S3-compatible storage (with `s3` feature)
//!
//! # Example
//!
//! ```no_run
//! use storage::{ObjectStore, LocalObjectStore};
//! use bytes::Bytes;
//!
//! # async fn example() -> uploader_core::Result<()> {
//! let store = LocalObjectStore::new("/tmp/blobs");
//! store.put("bucket", "tensorboard-t/e/r/ts/blob-1", Bytes::from(vec![1, 2, 3])).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod local;

#[cfg(feature = "s3")]
mod s3;

pub use backend::{blob_object_path, ObjectStore};
pub use local::LocalObjectStore;

#[cfg(feature = "s3")]
pub use s3::S3ObjectStore;
