//! Uploader pipeline
//!
//! Orchestrates the continuous upload cycle: poll the logdir, classify
//! records per plugin, batch them under per-request byte budgets, and
//! emit rate-limited write RPCs. Blob payloads detour through object
//! storage and only their ids travel on the metadata RPCs.

pub mod dispatch;
pub mod graph;
pub mod senders;
pub mod tracker;
pub mod uploader;

pub use dispatch::Dispatcher;
pub use tracker::UploadTracker;
pub use uploader::TensorboardUploader;
