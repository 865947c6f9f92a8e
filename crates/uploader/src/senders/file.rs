//! File-backed blob sending
//!
//! Used by the profile uploader: payloads are files on disk (or objects
//! in a source bucket) rather than in-memory byte strings. The blob id is
//! the file's basename, and the write goes through the per-run endpoint
//! with the time-series display name as its id.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, warn};

use metadata::{write_rpc_error, OnePlatformResourceManager, TensorboardService};
use storage::{blob_object_path, ObjectStore};
use tb_proto::aiplatform::{
    time_series_data_point::Value, TensorboardBlob, TensorboardBlobSequence, TimeSeriesData,
    TimeSeriesDataPoint, ValueType, WriteTensorboardRunDataRequest,
};
use uploader_core::types::resource_id;
use uploader_core::{
    BlobStorageConfig, Error, LimitConfig, Plugin, RateLimitConfig, RateLimiter, Result, WallTime,
};

use super::blob::path_segment;
use crate::tracker::UploadTracker;

pub struct FileSender {
    client: Arc<dyn TensorboardService>,
    store: Arc<dyn ObjectStore>,
    experiment_name: String,
    tensorboard_id: String,
    experiment_id: String,
    logdir_root: PathBuf,
    bucket: String,
    folder: Option<String>,
    source_bucket: Option<String>,
    limiter: RateLimiter,
    max_blob_size: u64,
}

impl FileSender {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn TensorboardService>,
        store: Arc<dyn ObjectStore>,
        experiment_name: String,
        logdir_root: PathBuf,
        storage: &BlobStorageConfig,
        limits: &LimitConfig,
        intervals: &RateLimitConfig,
    ) -> Result<Self> {
        let tensorboard_id = path_segment(&experiment_name, "tensorboards")
            .ok_or_else(|| Error::InvalidConfig {
                message: format!("not an experiment resource name: {experiment_name}"),
            })?
            .to_string();
        let experiment_id = resource_id(&experiment_name).to_string();
        Ok(Self {
            client,
            store,
            experiment_name,
            tensorboard_id,
            experiment_id,
            logdir_root,
            bucket: storage.bucket.clone(),
            folder: storage.folder.clone(),
            source_bucket: storage.source_bucket.clone(),
            limiter: RateLimiter::new(intervals.blob_interval),
            max_blob_size: limits.max_blob_size,
        })
    }

    /// Upload `files` as one blob-sequence point under `tag`
    ///
    /// Missing or oversized files are skipped with a warning; when
    /// nothing survives, no RPC is issued.
    pub async fn add_files(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        run_display_name: &str,
        files: &[PathBuf],
        tag: &str,
        plugin: Plugin,
        event_timestamp: WallTime,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        let run = resources.get_run_resource_name(run_display_name).await?;
        resources
            .get_time_series_resource_name(&run, tag, plugin, &[])
            .await?;

        let mut blob_ids = Vec::new();
        for file in files {
            let metadata = match tokio::fs::metadata(file).await {
                Ok(metadata) => metadata,
                Err(_) => {
                    warn!(file = %file.display(), "File no longer exists; skipping");
                    continue;
                }
            };
            if metadata.len() > self.max_blob_size {
                warn!(
                    file = %file.display(),
                    size = metadata.len(),
                    limit = self.max_blob_size,
                    "File exceeds blob size limit; skipping"
                );
                tracker.blob_skipped();
                continue;
            }
            let Some(blob_id) = file.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            let dst_path = blob_object_path(
                self.folder.as_deref(),
                &self.tensorboard_id,
                &self.experiment_id,
                resource_id(&run),
                tag,
                &blob_id,
            );

            self.limiter.tick().await;
            let transferred = match &self.source_bucket {
                Some(source_bucket) => {
                    self.copy_from_bucket(source_bucket, file, &dst_path).await
                }
                None => self.upload_from_disk(file, &dst_path).await,
            };
            match transferred {
                Ok(()) => {
                    tracker.file_uploaded(metadata.len());
                    blob_ids.push(blob_id);
                }
                Err(e) => {
                    error!(file = %file.display(), error = %e, "File transfer failed; skipping");
                }
            }
        }

        if blob_ids.is_empty() {
            return Ok(());
        }

        let request = WriteTensorboardRunDataRequest {
            tensorboard_run: run,
            time_series_data: vec![TimeSeriesData {
                tensorboard_time_series_id: tag.to_string(),
                value_type: ValueType::BlobSequence as i32,
                values: vec![TimeSeriesDataPoint {
                    wall_time: event_timestamp,
                    step: 0,
                    value: Some(Value::Blobs(TensorboardBlobSequence {
                        values: blob_ids
                            .into_iter()
                            .map(|id| TensorboardBlob { id })
                            .collect(),
                    })),
                }],
            }],
        };
        match self.client.write_tensorboard_run_data(request).await {
            Ok(_) => {
                tracker.request_sent();
                Ok(())
            }
            Err(status) => {
                let err =
                    write_rpc_error("WriteTensorboardRunData", &self.experiment_name, &status);
                if err.is_fatal() {
                    return Err(err);
                }
                error!(tag, error = %err, "File write failed; dropping point");
                Ok(())
            }
        }
    }

    async fn upload_from_disk(&self, file: &Path, dst_path: &str) -> Result<()> {
        let data = tokio::fs::read(file).await?;
        self.store
            .put(&self.bucket, dst_path, Bytes::from(data))
            .await
    }

    async fn copy_from_bucket(
        &self,
        source_bucket: &str,
        file: &Path,
        dst_path: &str,
    ) -> Result<()> {
        let src_path = file
            .strip_prefix(&self.logdir_root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");
        self.store
            .copy(source_bucket, &src_path, &self.bucket, dst_path)
            .await
    }
}
