//! Mediashelf Storage Library
//!
//! Storage abstraction over named disks. Each disk is one `Storage` backend
//! (local filesystem or S3); the `StorageGateway` routes operations to a disk by name.
//!
//! # Storage key format
//!
//! Files added to a collection live at `{media_id}/{file_name}`. Conversions live at
//! `{media_id}/conversions/{stem}-{conversion}.jpg`. Staged uploads are flat
//! `{uuid}.{ext}` keys on the uploads disk.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod content_type;
pub mod factory;
pub mod gateway;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_gateway;
pub use gateway::{StorageGateway, StorageHandle};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediashelf_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult};
