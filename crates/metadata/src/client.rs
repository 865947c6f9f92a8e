//! RPC surface of the tensorboard metadata service

use async_trait::async_trait;
use tb_proto::aiplatform::{
    CreateTensorboardExperimentRequest, CreateTensorboardRunRequest,
    CreateTensorboardTimeSeriesRequest, ListTensorboardExperimentsRequest,
    ListTensorboardExperimentsResponse, ListTensorboardRunsRequest, ListTensorboardRunsResponse,
    ListTensorboardTimeSeriesRequest, ListTensorboardTimeSeriesResponse, TensorboardExperiment,
    TensorboardRun, TensorboardTimeSeries, WriteTensorboardExperimentDataRequest,
    WriteTensorboardExperimentDataResponse, WriteTensorboardRunDataRequest,
    WriteTensorboardRunDataResponse,
};
use tonic::Status;
use uploader_core::Error;

/// Async trait over the metadata RPCs the uploader issues
///
/// Errors are raw `tonic::Status`; callers translate codes they care
/// about (ALREADY_EXISTS recovery, NOT_FOUND fatality) at their own
/// boundary.
#[async_trait]
pub trait TensorboardService: Send + Sync {
    async fn create_tensorboard_experiment(
        &self,
        request: CreateTensorboardExperimentRequest,
    ) -> Result<TensorboardExperiment, Status>;

    async fn list_tensorboard_experiments(
        &self,
        request: ListTensorboardExperimentsRequest,
    ) -> Result<ListTensorboardExperimentsResponse, Status>;

    async fn create_tensorboard_run(
        &self,
        request: CreateTensorboardRunRequest,
    ) -> Result<TensorboardRun, Status>;

    async fn list_tensorboard_runs(
        &self,
        request: ListTensorboardRunsRequest,
    ) -> Result<ListTensorboardRunsResponse, Status>;

    async fn create_tensorboard_time_series(
        &self,
        request: CreateTensorboardTimeSeriesRequest,
    ) -> Result<TensorboardTimeSeries, Status>;

    async fn list_tensorboard_time_series(
        &self,
        request: ListTensorboardTimeSeriesRequest,
    ) -> Result<ListTensorboardTimeSeriesResponse, Status>;

    async fn write_tensorboard_experiment_data(
        &self,
        request: WriteTensorboardExperimentDataRequest,
    ) -> Result<WriteTensorboardExperimentDataResponse, Status>;

    async fn write_tensorboard_run_data(
        &self,
        request: WriteTensorboardRunDataRequest,
    ) -> Result<WriteTensorboardRunDataResponse, Status>;
}

/// Translate a write-RPC failure into the pipeline error model:
/// NOT_FOUND means the experiment is gone and the pipeline must stop;
/// everything else is transient.
pub fn write_rpc_error(operation: &str, experiment: &str, status: &Status) -> Error {
    if status.code() == tonic::Code::NotFound {
        Error::ExperimentNotFound {
            experiment: experiment.to_string(),
        }
    } else {
        Error::Rpc {
            operation: operation.to_string(),
            message: status.message().to_string(),
        }
    }
}
