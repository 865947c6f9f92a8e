//! Metadata-service client layer
//!
//! The remote tensorboard service is consumed through the
//! [`TensorboardService`] trait: a gRPC implementation for production and
//! an in-memory implementation for tests and dry runs. The
//! [`OnePlatformResourceManager`] reconciles experiment/run/time-series
//! resources with de-duplicated at-least-once semantics on top of it.

pub mod client;
pub mod fake;
pub mod grpc;
pub mod resource;

pub use client::{write_rpc_error, TensorboardService};
pub use fake::InMemoryTensorboardService;
pub use grpc::GrpcTensorboardService;
pub use resource::{create_or_adopt_experiment, OnePlatformResourceManager};
