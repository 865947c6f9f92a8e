//! Blob-sequence sending
//!
//! Payload bytes go to object storage under a deterministic path; the
//! write RPC carries only the blob ids. Each blob record becomes its own
//! single-point request. Oversized blobs are skipped, and a point whose
//! every blob was skipped is pruned before the RPC.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, warn};
use uuid::Uuid;

use event_log::{EventRecord, RecordValue};
use metadata::{write_rpc_error, OnePlatformResourceManager, TensorboardService};
use storage::{blob_object_path, ObjectStore};
use tb_proto::aiplatform::{
    time_series_data_point::Value, TensorboardBlob, TensorboardBlobSequence, TimeSeriesData,
    TimeSeriesDataPoint, ValueType, WriteTensorboardExperimentDataRequest,
    WriteTensorboardRunDataRequest,
};
use uploader_core::types::resource_id;
use uploader_core::{BlobStorageConfig, Error, LimitConfig, RateLimitConfig, RateLimiter, Result};

use crate::tracker::UploadTracker;

/// The path segment following `collection` in a resource name
pub(crate) fn path_segment<'a>(resource_name: &'a str, collection: &str) -> Option<&'a str> {
    let mut segments = resource_name.split('/');
    while let Some(segment) = segments.next() {
        if segment == collection {
            return segments.next();
        }
    }
    None
}

pub struct BlobSender {
    client: Arc<dyn TensorboardService>,
    store: Arc<dyn ObjectStore>,
    experiment_name: String,
    tensorboard_id: String,
    experiment_id: String,
    bucket: String,
    folder: Option<String>,
    limiter: RateLimiter,
    max_blob_size: u64,
}

impl BlobSender {
    pub fn new(
        client: Arc<dyn TensorboardService>,
        store: Arc<dyn ObjectStore>,
        experiment_name: String,
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
            bucket: storage.bucket.clone(),
            folder: storage.folder.clone(),
            limiter: RateLimiter::new(intervals.blob_interval),
            max_blob_size: limits.max_blob_size,
        })
    }

    /// Upload the record's blobs and register their ids in a
    /// single-point write request
    pub async fn send_blobs(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        run_display_name: &str,
        record: &EventRecord,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        let RecordValue::Blobs(blobs) = &record.value else {
            return Ok(());
        };
        let run = resources.get_run_resource_name(run_display_name).await?;
        let time_series = resources
            .get_time_series_resource_name(&run, &record.tag, record.plugin, &record.plugin_data)
            .await?;
        let time_series_id = resource_id(&time_series).to_string();

        let mut blob_ids = Vec::new();
        for blob in blobs {
            if blob.len() as u64 > self.max_blob_size {
                warn!(
                    run = run_display_name,
                    tag = %record.tag,
                    size = blob.len(),
                    limit = self.max_blob_size,
                    "Blob exceeds size limit; skipping"
                );
                tracker.blob_skipped();
                continue;
            }
            let blob_id = Uuid::new_v4().to_string();
            let path = blob_object_path(
                self.folder.as_deref(),
                &self.tensorboard_id,
                &self.experiment_id,
                resource_id(&run),
                &time_series_id,
                &blob_id,
            );
            self.limiter.tick().await;
            match self
                .store
                .put(&self.bucket, &path, Bytes::from(blob.clone()))
                .await
            {
                Ok(()) => {
                    tracker.blob_uploaded(blob.len() as u64);
                    blob_ids.push(blob_id);
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Blob upload failed; dropping blob");
                }
            }
        }

        // Every blob skipped or failed: prune the point entirely
        if blob_ids.is_empty() {
            return Ok(());
        }

        let point = TimeSeriesDataPoint {
            wall_time: record.wall_time,
            step: record.step,
            value: Some(Value::Blobs(TensorboardBlobSequence {
                values: blob_ids
                    .into_iter()
                    .map(|id| TensorboardBlob { id })
                    .collect(),
            })),
        };
        let request = WriteTensorboardExperimentDataRequest {
            tensorboard_experiment: self.experiment_name.clone(),
            write_run_data_requests: vec![WriteTensorboardRunDataRequest {
                tensorboard_run: run,
                time_series_data: vec![TimeSeriesData {
                    tensorboard_time_series_id: time_series_id,
                    value_type: ValueType::BlobSequence as i32,
                    values: vec![point],
                }],
            }],
        };

        self.limiter.tick().await;
        match self.client.write_tensorboard_experiment_data(request).await {
            Ok(_) => {
                tracker.request_sent();
                Ok(())
            }
            Err(status) => {
                let err = write_rpc_error(
                    "WriteTensorboardExperimentData",
                    &self.experiment_name,
                    &status,
                );
                if err.is_fatal() {
                    return Err(err);
                }
                error!(tag = %record.tag, error = %err, "Blob write failed; dropping point");
                Ok(())
            }
        }
    }
}
