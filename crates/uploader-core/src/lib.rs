//! Core types shared across the uploader pipeline
//!
//! Holds the error type, configuration structs, plugin/data-class enums,
//! the per-class RPC rate limiter and the per-request byte budget.

pub mod budget;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod types;

pub use budget::{BudgetError, ByteBudgetManager};
pub use config::{BlobStorageConfig, LimitConfig, RateLimitConfig, UploaderConfig};
pub use error::{Error, Result};
pub use rate_limit::RateLimiter;
pub use types::{DataClass, Plugin, Step, WallTime};
