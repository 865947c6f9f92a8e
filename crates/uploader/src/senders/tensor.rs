//! Tensor point batching
//!
//! Same shape as the scalar sender with a larger budget and one extra
//! rule: a single tensor point larger than `max_tensor_point_size` is
//! dropped up front and never buffered.

use std::sync::Arc;

use event_log::{EventRecord, RecordValue};
use metadata::{OnePlatformResourceManager, TensorboardService};
use prost::Message;
use tb_proto::aiplatform::{time_series_data_point::Value, TensorboardTensor, TimeSeriesDataPoint};
use tracing::warn;
use uploader_core::types::resource_id;
use uploader_core::{LimitConfig, RateLimitConfig, Result};

use super::batched::{BatchedRequestSender, PointKind};
use crate::tracker::UploadTracker;

pub struct TensorSender {
    inner: BatchedRequestSender,
    max_point_size: usize,
}

impl TensorSender {
    pub fn new(
        client: Arc<dyn TensorboardService>,
        experiment_name: String,
        limits: &LimitConfig,
        intervals: &RateLimitConfig,
    ) -> Result<Self> {
        Ok(Self {
            inner: BatchedRequestSender::new(
                client,
                experiment_name,
                PointKind::Tensor,
                limits.max_tensor_request_size,
                intervals.tensor_interval,
            )?,
            max_point_size: limits.max_tensor_point_size,
        })
    }

    pub async fn add_record(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        run_display_name: &str,
        record: &EventRecord,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        let RecordValue::Tensor(tensor) = &record.value else {
            return Ok(());
        };
        let tensor_bytes = tensor.encode_to_vec();
        if tensor_bytes.len() > self.max_point_size {
            warn!(
                run = run_display_name,
                tag = %record.tag,
                step = record.step,
                size = tensor_bytes.len(),
                limit = self.max_point_size,
                "Tensor point exceeds size limit; dropping"
            );
            tracker.tensor_point_dropped();
            return Ok(());
        }

        let run = resources.get_run_resource_name(run_display_name).await?;
        let time_series = resources
            .get_time_series_resource_name(&run, &record.tag, record.plugin, &record.plugin_data)
            .await?;
        let point = TimeSeriesDataPoint {
            wall_time: record.wall_time,
            step: record.step,
            value: Some(Value::Tensor(TensorboardTensor {
                value: tensor_bytes,
            })),
        };
        self.inner
            .add_point(&run, resource_id(&time_series), point, tracker)
            .await
    }

    pub async fn flush(&mut self, tracker: &mut UploadTracker) -> Result<()> {
        self.inner.flush(tracker).await
    }
}
