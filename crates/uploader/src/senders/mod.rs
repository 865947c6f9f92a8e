//! Per-plugin request senders
//!
//! Scalars and tensors batch points under a byte budget; blob sequences
//! and profile files stream payloads to object storage and register only
//! blob ids with the metadata service.

mod batched;
pub mod blob;
pub mod file;
pub mod profile;
pub mod scalar;
pub mod tensor;

pub use blob::BlobSender;
pub use file::FileSender;
pub use profile::ProfileSender;
pub use scalar::ScalarSender;
pub use tensor::TensorSender;
