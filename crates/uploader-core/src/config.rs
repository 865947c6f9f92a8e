//! Uploader configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::types::Plugin;

/// Main uploader configuration, threaded from `main`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Log directory to scan for event files
    pub logdir: PathBuf,

    /// Fully-qualified tensorboard resource name
    /// (`projects/P/locations/L/tensorboards/T`)
    pub tensorboard_resource_name: String,

    /// Display name for the experiment created or adopted at startup
    pub experiment_display_name: String,

    /// Experiment description
    pub description: Option<String>,

    /// Optional prefix prepended to every run display name
    pub run_name_prefix: Option<String>,

    /// Perform a single full pass and terminate
    pub one_shot: bool,

    /// Plugins allowed through the dispatch boundary
    pub allowed_plugins: Vec<Plugin>,

    /// Per-request and per-payload size limits
    pub limits: LimitConfig,

    /// Minimum intervals between RPCs of each class
    pub intervals: RateLimitConfig,

    /// Blob storage destination
    pub storage: BlobStorageConfig,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            logdir: PathBuf::from("."),
            tensorboard_resource_name: String::new(),
            experiment_display_name: String::new(),
            description: None,
            run_name_prefix: None,
            one_shot: false,
            allowed_plugins: Plugin::ALL.to_vec(),
            limits: LimitConfig::default(),
            intervals: RateLimitConfig::default(),
            storage: BlobStorageConfig::default(),
        }
    }
}

/// Size limits per request class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitConfig {
    /// Maximum serialized size of a scalar write request
    pub max_scalar_request_size: usize,

    /// Maximum serialized size of a tensor write request
    pub max_tensor_request_size: usize,

    /// Tensor points larger than this are dropped with a warning
    pub max_tensor_point_size: usize,

    /// Blobs larger than this are skipped with a warning
    pub max_blob_size: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_scalar_request_size: 128 * 1024,
            max_tensor_request_size: 512 * 1024,
            max_tensor_point_size: 16 * 1024,
            max_blob_size: 10 * 1024 * 1024,
        }
    }
}

/// Minimum interval between successive RPCs, per class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Scalar write requests
    #[serde(with = "duration_millis")]
    pub scalar_interval: Duration,

    /// Tensor write requests
    #[serde(with = "duration_millis")]
    pub tensor_interval: Duration,

    /// Blob uploads and blob write requests
    #[serde(with = "duration_millis")]
    pub blob_interval: Duration,

    /// Logdir polling
    #[serde(with = "duration_millis")]
    pub logdir_poll_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            scalar_interval: Duration::from_secs(10),
            tensor_interval: Duration::from_secs(10),
            blob_interval: Duration::from_secs(10),
            logdir_poll_interval: Duration::from_secs(5),
        }
    }
}

/// Blob storage destination for BLOB_SEQUENCE payloads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlobStorageConfig {
    /// Destination bucket
    pub bucket: String,

    /// Optional folder prepended to every blob path
    pub folder: Option<String>,

    /// Bucket holding the logdir itself; when set, profile files are
    /// copied bucket-to-bucket instead of re-uploaded from disk
    pub source_bucket: Option<String>,
}

/// Duration serialization helper in milliseconds
mod duration_millis {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
