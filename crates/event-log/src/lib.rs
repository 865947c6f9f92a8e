//! Event-file loading
//!
//! Reads append-only TFRecord streams produced by training-framework
//! writers, upgrades old event shapes, and polls whole log directories
//! run by run.

pub mod compat;
pub mod event_file;
pub mod logdir;
pub mod record;

pub use compat::{EventRecord, RecordValue, TagMetadata, RUN_GRAPH_TAG};
pub use event_file::EventFileLoader;
pub use logdir::LogdirLoader;
