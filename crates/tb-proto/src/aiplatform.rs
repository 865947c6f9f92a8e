//! Metadata-service message types
//!
//! Request/response shapes for the tensorboard write surface. Wall times
//! travel as fractional epoch seconds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorboardExperiment {
    /// `projects/P/locations/L/tensorboards/T/experiments/E`
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    #[prost(string, tag = "2")]
    pub display_name: ::prost::alloc::string::String,

    #[prost(string, tag = "3")]
    pub description: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorboardRun {
    /// `…/experiments/E/runs/R`
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    #[prost(string, tag = "2")]
    pub display_name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorboardTimeSeries {
    /// `…/runs/R/timeSeries/TS`
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    #[prost(string, tag = "2")]
    pub display_name: ::prost::alloc::string::String,

    #[prost(enumeration = "ValueType", tag = "4")]
    pub value_type: i32,

    #[prost(string, tag = "8")]
    pub plugin_name: ::prost::alloc::string::String,

    /// Opaque plugin metadata carried from the first summary of the tag
    #[prost(bytes, tag = "9")]
    pub plugin_data: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ValueType {
    Unspecified = 0,
    Scalar = 1,
    Tensor = 2,
    BlobSequence = 3,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeSeriesData {
    /// Final path segment of the time-series resource name
    #[prost(string, tag = "1")]
    pub tensorboard_time_series_id: ::prost::alloc::string::String,

    #[prost(enumeration = "ValueType", tag = "2")]
    pub value_type: i32,

    #[prost(message, repeated, tag = "3")]
    pub values: ::prost::alloc::vec::Vec<TimeSeriesDataPoint>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeSeriesDataPoint {
    /// Fractional seconds since the Unix epoch
    #[prost(double, tag = "1")]
    pub wall_time: f64,

    #[prost(int64, tag = "2")]
    pub step: i64,

    #[prost(oneof = "time_series_data_point::Value", tags = "3, 4, 5")]
    pub value: ::core::option::Option<time_series_data_point::Value>,
}

pub mod time_series_data_point {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Value {
        #[prost(message, tag = "3")]
        Scalar(super::Scalar),

        #[prost(message, tag = "4")]
        Tensor(super::TensorboardTensor),

        #[prost(message, tag = "5")]
        Blobs(super::TensorboardBlobSequence),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Scalar {
    #[prost(double, tag = "1")]
    pub value: f64,
}

/// Serialized `TensorProto` carried opaquely
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorboardTensor {
    #[prost(bytes, tag = "1")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorboardBlobSequence {
    #[prost(message, repeated, tag = "1")]
    pub values: ::prost::alloc::vec::Vec<TensorboardBlob>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorboardBlob {
    /// Object-storage blob id; payload bytes never travel on this RPC
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
}

// ---- Requests and responses ----

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTensorboardExperimentRequest {
    /// Parent tensorboard resource name
    #[prost(string, tag = "1")]
    pub parent: ::prost::alloc::string::String,

    #[prost(message, optional, tag = "2")]
    pub tensorboard_experiment: ::core::option::Option<TensorboardExperiment>,

    #[prost(string, tag = "3")]
    pub tensorboard_experiment_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTensorboardExperimentsRequest {
    #[prost(string, tag = "1")]
    pub parent: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTensorboardExperimentsResponse {
    #[prost(message, repeated, tag = "1")]
    pub tensorboard_experiments: ::prost::alloc::vec::Vec<TensorboardExperiment>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTensorboardRunRequest {
    /// Parent experiment resource name
    #[prost(string, tag = "1")]
    pub parent: ::prost::alloc::string::String,

    #[prost(message, optional, tag = "2")]
    pub tensorboard_run: ::core::option::Option<TensorboardRun>,

    /// Client-generated id that becomes the final resource-name segment
    #[prost(string, tag = "3")]
    pub tensorboard_run_id: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTensorboardRunsRequest {
    #[prost(string, tag = "1")]
    pub parent: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTensorboardRunsResponse {
    #[prost(message, repeated, tag = "1")]
    pub tensorboard_runs: ::prost::alloc::vec::Vec<TensorboardRun>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateTensorboardTimeSeriesRequest {
    /// Parent run resource name
    #[prost(string, tag = "1")]
    pub parent: ::prost::alloc::string::String,

    #[prost(message, optional, tag = "2")]
    pub tensorboard_time_series: ::core::option::Option<TensorboardTimeSeries>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTensorboardTimeSeriesRequest {
    #[prost(string, tag = "1")]
    pub parent: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListTensorboardTimeSeriesResponse {
    #[prost(message, repeated, tag = "1")]
    pub tensorboard_time_series: ::prost::alloc::vec::Vec<TensorboardTimeSeries>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteTensorboardExperimentDataRequest {
    /// Experiment resource name
    #[prost(string, tag = "1")]
    pub tensorboard_experiment: ::prost::alloc::string::String,

    #[prost(message, repeated, tag = "2")]
    pub write_run_data_requests: ::prost::alloc::vec::Vec<WriteTensorboardRunDataRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteTensorboardExperimentDataResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteTensorboardRunDataRequest {
    /// Run resource name
    #[prost(string, tag = "1")]
    pub tensorboard_run: ::prost::alloc::string::String,

    #[prost(message, repeated, tag = "2")]
    pub time_series_data: ::prost::alloc::vec::Vec<TimeSeriesData>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WriteTensorboardRunDataResponse {}
