//! gRPC implementation of the metadata-service trait
//!
//! The message types are maintained by hand in `tb-proto`, so the unary
//! calls are written out against `tonic::client::Grpc` directly instead
//! of going through build-time codegen. An opaque bearer token, when
//! supplied by the credential provider, rides along as request metadata.

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
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tonic::{codec::ProstCodec, Request, Status};

/// Tensorboard metadata service over a tonic channel
#[derive(Debug, Clone)]
pub struct GrpcTensorboardService {
    inner: tonic::client::Grpc<Channel>,
    bearer_token: Option<MetadataValue<Ascii>>,
}

impl GrpcTensorboardService {
    /// Connect to the service endpoint
    ///
    /// `access_token`, when present, is attached to every request as a
    /// bearer `authorization` header.
    pub async fn connect(
        endpoint: String,
        access_token: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let channel = Endpoint::from_shared(endpoint)?.connect().await?;
        let bearer_token = match access_token {
            Some(token) => Some(format!("Bearer {token}").parse()?),
            None => None,
        };
        Ok(Self {
            inner: tonic::client::Grpc::new(channel),
            bearer_token,
        })
    }

    async fn unary<Req, Resp>(&self, method: &'static str, message: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + 'static,
        Resp: prost::Message + Default + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("connection error: {e}")))?;

        let mut request = Request::new(message);
        if let Some(token) = &self.bearer_token {
            request.metadata_mut().insert("authorization", token.clone());
        }

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let path = PathAndQuery::from_static(method);
        grpc.unary(request, path, codec)
            .await
            .map(|response| response.into_inner())
    }
}

macro_rules! method_path {
    ($method:literal) => {
        concat!("/", "google.cloud.aiplatform.v1.TensorboardService", "/", $method)
    };
}

#[async_trait]
impl crate::TensorboardService for GrpcTensorboardService {
    async fn create_tensorboard_experiment(
        &self,
        request: CreateTensorboardExperimentRequest,
    ) -> Result<TensorboardExperiment, Status> {
        self.unary(method_path!("CreateTensorboardExperiment"), request)
            .await
    }

    async fn list_tensorboard_experiments(
        &self,
        request: ListTensorboardExperimentsRequest,
    ) -> Result<ListTensorboardExperimentsResponse, Status> {
        self.unary(method_path!("ListTensorboardExperiments"), request)
            .await
    }

    async fn create_tensorboard_run(
        &self,
        request: CreateTensorboardRunRequest,
    ) -> Result<TensorboardRun, Status> {
        self.unary(method_path!("CreateTensorboardRun"), request)
            .await
    }

    async fn list_tensorboard_runs(
        &self,
        request: ListTensorboardRunsRequest,
    ) -> Result<ListTensorboardRunsResponse, Status> {
        self.unary(method_path!("ListTensorboardRuns"), request)
            .await
    }

    async fn create_tensorboard_time_series(
        &self,
        request: CreateTensorboardTimeSeriesRequest,
    ) -> Result<TensorboardTimeSeries, Status> {
        self.unary(method_path!("CreateTensorboardTimeSeries"), request)
            .await
    }

    async fn list_tensorboard_time_series(
        &self,
        request: ListTensorboardTimeSeriesRequest,
    ) -> Result<ListTensorboardTimeSeriesResponse, Status> {
        self.unary(method_path!("ListTensorboardTimeSeries"), request)
            .await
    }

    async fn write_tensorboard_experiment_data(
        &self,
        request: WriteTensorboardExperimentDataRequest,
    ) -> Result<WriteTensorboardExperimentDataResponse, Status> {
        self.unary(method_path!("WriteTensorboardExperimentData"), request)
            .await
    }

    async fn write_tensorboard_run_data(
        &self,
        request: WriteTensorboardRunDataRequest,
    ) -> Result<WriteTensorboardRunDataResponse, Status> {
        self.unary(method_path!("WriteTensorboardRunData"), request)
            .await
    }
}
