//! Shared batching core for the scalar and tensor senders
//!
//! Accumulates points for one run at a time and flushes whenever the run
//! changes or the byte budget runs out. Budget charges mirror the wire
//! encoding: each new run, new time series and point is billed at its
//! length-delimited serialized cost.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use prost::Message;
use tracing::error;

use metadata::{write_rpc_error, TensorboardService};
use tb_proto::aiplatform::{
    TimeSeriesData, TimeSeriesDataPoint, ValueType, WriteTensorboardExperimentDataRequest,
    WriteTensorboardRunDataRequest,
};
use uploader_core::budget::length_delimited_cost;
use uploader_core::{BudgetError, ByteBudgetManager, Error, RateLimiter, Result};

use crate::tracker::UploadTracker;

/// Which tracker counter a flushed batch belongs to
#[derive(Debug, Clone, Copy)]
pub(crate) enum PointKind {
    Scalar,
    Tensor,
}

impl PointKind {
    fn value_type(self) -> ValueType {
        match self {
            PointKind::Scalar => ValueType::Scalar,
            PointKind::Tensor => ValueType::Tensor,
        }
    }
}

/// The request currently being built, always for a single run
struct RunBatch {
    run_resource_name: String,
    time_series: Vec<TimeSeriesData>,
    /// Time-series id -> index into `time_series`
    index: HashMap<String, usize>,
}

impl RunBatch {
    fn num_points(&self) -> u64 {
        self.time_series.iter().map(|ts| ts.values.len() as u64).sum()
    }
}

pub(crate) struct BatchedRequestSender {
    client: Arc<dyn TensorboardService>,
    experiment_name: String,
    kind: PointKind,
    budget: ByteBudgetManager,
    base_cost: usize,
    limiter: RateLimiter,
    batch: Option<RunBatch>,
}

impl BatchedRequestSender {
    pub(crate) fn new(
        client: Arc<dyn TensorboardService>,
        experiment_name: String,
        kind: PointKind,
        max_request_size: usize,
        interval: Duration,
    ) -> Result<Self> {
        let base_cost = WriteTensorboardExperimentDataRequest {
            tensorboard_experiment: experiment_name.clone(),
            write_run_data_requests: Vec::new(),
        }
        .encoded_len();
        let mut budget = ByteBudgetManager::new(max_request_size);
        budget.reset(base_cost).map_err(|e| Error::InvalidConfig {
            message: format!("max request size cannot hold an empty request: {e}"),
        })?;
        Ok(Self {
            client,
            experiment_name,
            kind,
            budget,
            base_cost,
            limiter: RateLimiter::new(interval),
            batch: None,
        })
    }

    /// Buffer one point, flushing first on a run change or a full budget
    pub(crate) async fn add_point(
        &mut self,
        run_resource_name: &str,
        time_series_id: &str,
        point: TimeSeriesDataPoint,
        tracker: &mut UploadTracker,
    ) -> Result<()> {
        if self
            .batch
            .as_ref()
            .is_some_and(|b| b.run_resource_name != run_resource_name)
        {
            self.flush(tracker).await?;
        }

        if self.try_charge(run_resource_name, time_series_id, &point).is_err() {
            self.flush(tracker).await?;
            self.try_charge(run_resource_name, time_series_id, &point)
                .map_err(|e: BudgetError| Error::Internal {
                    message: format!("a single point does not fit in an empty request: {e}"),
                })?;
        }

        self.append(run_resource_name, time_series_id, point);
        Ok(())
    }

    /// Send the in-flight request, if any
    ///
    /// NOT_FOUND is fatal and propagates; any other write failure drops
    /// the batch and is logged (the next poll produces fresh records).
    pub(crate) async fn flush(&mut self, tracker: &mut UploadTracker) -> Result<()> {
        let Some(batch) = self.batch.take() else {
            return Ok(());
        };
        self.budget
            .reset(self.base_cost)
            .map_err(|e| Error::Internal {
                message: e.to_string(),
            })?;

        let num_points = batch.num_points();
        if num_points == 0 {
            return Ok(());
        }

        self.limiter.tick().await;
        let request = WriteTensorboardExperimentDataRequest {
            tensorboard_experiment: self.experiment_name.clone(),
            write_run_data_requests: vec![WriteTensorboardRunDataRequest {
                tensorboard_run: batch.run_resource_name,
                time_series_data: batch.time_series,
            }],
        };
        match self.client.write_tensorboard_experiment_data(request).await {
            Ok(_) => {
                tracker.request_sent();
                match self.kind {
                    PointKind::Scalar => tracker.scalar_points_sent(num_points),
                    PointKind::Tensor => tracker.tensor_points_sent(num_points),
                }
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
                error!(error = %err, points = num_points, "Write failed; dropping batch");
                Ok(())
            }
        }
    }

    /// Charge the marginal cost of this point against the budget
    fn try_charge(
        &mut self,
        run_resource_name: &str,
        time_series_id: &str,
        point: &TimeSeriesDataPoint,
    ) -> std::result::Result<(), BudgetError> {
        let mut cost = length_delimited_cost(point.encoded_len());

        if self.batch.is_none() {
            let empty_run = WriteTensorboardRunDataRequest {
                tensorboard_run: run_resource_name.to_string(),
                time_series_data: Vec::new(),
            };
            cost += length_delimited_cost(empty_run.encoded_len());
        }

        let known_series = self
            .batch
            .as_ref()
            .is_some_and(|b| b.index.contains_key(time_series_id));
        if !known_series {
            let empty_series = TimeSeriesData {
                tensorboard_time_series_id: time_series_id.to_string(),
                value_type: self.kind.value_type() as i32,
                values: Vec::new(),
            };
            cost += length_delimited_cost(empty_series.encoded_len());
        }

        self.budget.add_point(cost)
    }

    fn append(&mut self, run_resource_name: &str, time_series_id: &str, point: TimeSeriesDataPoint) {
        let batch = self.batch.get_or_insert_with(|| RunBatch {
            run_resource_name: run_resource_name.to_string(),
            time_series: Vec::new(),
            index: HashMap::new(),
        });
        let idx = match batch.index.get(time_series_id) {
            Some(idx) => *idx,
            None => {
                batch.time_series.push(TimeSeriesData {
                    tensorboard_time_series_id: time_series_id.to_string(),
                    value_type: self.kind.value_type() as i32,
                    values: Vec::new(),
                });
                let idx = batch.time_series.len() - 1;
                batch.index.insert(time_series_id.to_string(), idx);
                idx
            }
        };
        batch.time_series[idx].values.push(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metadata::InMemoryTensorboardService;
    use tb_proto::aiplatform::{
        time_series_data_point::Value, CreateTensorboardExperimentRequest, Scalar,
        TensorboardExperiment,
    };

    const TENSORBOARD: &str = "projects/p/locations/l/tensorboards/t";

    async fn experiment(service: &InMemoryTensorboardService) -> String {
        service
            .create_tensorboard_experiment(CreateTensorboardExperimentRequest {
                parent: TENSORBOARD.to_string(),
                tensorboard_experiment: Some(TensorboardExperiment::default()),
                tensorboard_experiment_id: "e1".to_string(),
            })
            .await
            .unwrap()
            .name
    }

    fn scalar_point(step: i64, value: f64) -> TimeSeriesDataPoint {
        TimeSeriesDataPoint {
            wall_time: step as f64,
            step,
            value: Some(Value::Scalar(Scalar { value })),
        }
    }

    #[tokio::test]
    async fn test_points_batch_into_one_request() {
        let service = Arc::new(InMemoryTensorboardService::new());
        let experiment = experiment(&service).await;
        let mut sender = BatchedRequestSender::new(
            service.clone(),
            experiment.clone(),
            PointKind::Scalar,
            128 * 1024,
            Duration::ZERO,
        )
        .unwrap();
        let mut tracker = UploadTracker::new();
        let run = format!("{experiment}/runs/r1");

        for step in 0..3 {
            sender
                .add_point(&run, "ts1", scalar_point(step, 0.5), &mut tracker)
                .await
                .unwrap();
        }
        sender.flush(&mut tracker).await.unwrap();

        let writes = service.experiment_writes();
        assert_eq!(writes.len(), 1);
        let run_data = &writes[0].write_run_data_requests[0];
        assert_eq!(run_data.tensorboard_run, run);
        assert_eq!(run_data.time_series_data[0].values.len(), 3);
        assert_eq!(tracker.totals().scalar_points, 3);
        assert_eq!(tracker.totals().requests_sent, 1);
    }

    #[tokio::test]
    async fn test_run_change_splits_requests() {
        let service = Arc::new(InMemoryTensorboardService::new());
        let experiment = experiment(&service).await;
        let mut sender = BatchedRequestSender::new(
            service.clone(),
            experiment.clone(),
            PointKind::Scalar,
            128 * 1024,
            Duration::ZERO,
        )
        .unwrap();
        let mut tracker = UploadTracker::new();

        let run_a = format!("{experiment}/runs/a");
        let run_b = format!("{experiment}/runs/b");
        sender
            .add_point(&run_a, "ts", scalar_point(1, 1.0), &mut tracker)
            .await
            .unwrap();
        sender
            .add_point(&run_b, "ts", scalar_point(1, 2.0), &mut tracker)
            .await
            .unwrap();
        sender.flush(&mut tracker).await.unwrap();

        let writes = service.experiment_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].write_run_data_requests[0].tensorboard_run, run_a);
        assert_eq!(writes[1].write_run_data_requests[0].tensorboard_run, run_b);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_flushes_and_retries() {
        let service = Arc::new(InMemoryTensorboardService::new());
        let experiment = experiment(&service).await;
        // Just enough room for the base request, the run, one series and
        // roughly one point
        let base = WriteTensorboardExperimentDataRequest {
            tensorboard_experiment: experiment.clone(),
            write_run_data_requests: Vec::new(),
        }
        .encoded_len();
        let mut sender = BatchedRequestSender::new(
            service.clone(),
            experiment.clone(),
            PointKind::Scalar,
            base + 120,
            Duration::ZERO,
        )
        .unwrap();
        let mut tracker = UploadTracker::new();
        let run = format!("{experiment}/runs/r1");

        for step in 0..4 {
            sender
                .add_point(&run, "ts1", scalar_point(step, 0.5), &mut tracker)
                .await
                .unwrap();
        }
        sender.flush(&mut tracker).await.unwrap();

        let writes = service.experiment_writes();
        assert!(writes.len() > 1, "expected budget-driven splits");
        let total: usize = writes
            .iter()
            .flat_map(|w| &w.write_run_data_requests)
            .flat_map(|r| &r.time_series_data)
            .map(|ts| ts.values.len())
            .sum();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_oversized_request_limit_rejected_at_construction() {
        let service = Arc::new(InMemoryTensorboardService::new());
        let experiment = experiment(&service).await;
        let err = BatchedRequestSender::new(
            service,
            experiment,
            PointKind::Scalar,
            4,
            Duration::ZERO,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[tokio::test]
    async fn test_not_found_on_flush_is_fatal() {
        let service = Arc::new(InMemoryTensorboardService::new());
        let experiment = experiment(&service).await;
        let mut sender = BatchedRequestSender::new(
            service.clone(),
            experiment.clone(),
            PointKind::Scalar,
            128 * 1024,
            Duration::ZERO,
        )
        .unwrap();
        let mut tracker = UploadTracker::new();
        let run = format!("{experiment}/runs/r1");
        sender
            .add_point(&run, "ts1", scalar_point(1, 1.0), &mut tracker)
            .await
            .unwrap();

        service.delete_experiment(&experiment);
        let err = sender.flush(&mut tracker).await.unwrap_err();
        assert!(matches!(err, Error::ExperimentNotFound { .. }));
    }

    #[tokio::test]
    async fn test_transient_failure_drops_batch() {
        let service = Arc::new(InMemoryTensorboardService::new());
        let experiment = experiment(&service).await;
        let mut sender = BatchedRequestSender::new(
            service.clone(),
            experiment.clone(),
            PointKind::Scalar,
            128 * 1024,
            Duration::ZERO,
        )
        .unwrap();
        let mut tracker = UploadTracker::new();
        let run = format!("{experiment}/runs/r1");
        sender
            .add_point(&run, "ts1", scalar_point(1, 1.0), &mut tracker)
            .await
            .unwrap();

        service.push_write_failure(tonic::Status::unavailable("flaky"));
        sender.flush(&mut tracker).await.unwrap();
        assert!(service.experiment_writes().is_empty());

        // Later points go through again
        sender
            .add_point(&run, "ts1", scalar_point(2, 2.0), &mut tracker)
            .await
            .unwrap();
        sender.flush(&mut tracker).await.unwrap();
        assert_eq!(service.experiment_writes().len(), 1);
    }
}
