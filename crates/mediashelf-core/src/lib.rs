//! Mediashelf Core Library
//!
//! Domain models, error types and configuration shared by every mediashelf crate.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, MediaShelfConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    Actor, MediaAction, MediaBatch, MediaRecord, OperationInput, OwnerRef, CustomProperties,
};
pub use storage_types::StorageBackend;
