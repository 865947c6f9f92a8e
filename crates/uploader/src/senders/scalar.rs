//! Scalar point batching

use std::sync::Arc;

use event_log::{EventRecord, RecordValue};
use metadata::{OnePlatformResourceManager, TensorboardService};
use tb_proto::aiplatform::{time_series_data_point::Value, Scalar, TimeSeriesDataPoint};
use uploader_core::types::resource_id;
use uploader_core::{LimitConfig, RateLimitConfig, Result};

use super::batched::{BatchedRequestSender, PointKind};
use crate::tracker::UploadTracker;

/// Batches scalar points across (run, tag) pairs under the scalar
/// request-size budget
pub struct ScalarSender {
    inner: BatchedRequestSender,
}

impl ScalarSender {
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
                PointKind::Scalar,
                limits.max_scalar_request_size,
                intervals.scalar_interval,
            )?,
        })
    }

    pub async fn add_record(
        &mut self,
        resources: &mut OnePlatformResourceManager,
        run_display_name: &str,
        record: &EventRecord,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        let RecordValue::Scalar(value) = &record.value else {
            return Ok(());
        };
        let run = resources.get_run_resource_name(run_display_name).await?;
        let time_series = resources
            .get_time_series_resource_name(&run, &record.tag, record.plugin, &record.plugin_data)
            .await?;
        let point = TimeSeriesDataPoint {
            wall_time: record.wall_time,
            step: record.step,
            value: Some(Value::Scalar(Scalar { value: *value })),
        };
        self.inner
            .add_point(&run, resource_id(&time_series), point, tracker)
            .await
    }

    pub async fn flush(&mut self, tracker: &mut UploadTracker) -> Result<()> {
        self.inner.flush(tracker).await
    }
}
