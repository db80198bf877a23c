//! Mediashelf API Library
//!
//! HTTP surface of the media collections service: staging uploads, serving files of
//! non-public disks, and the application setup that wires storage, the media store
//! and the owner catalog together.

mod api_doc;
pub mod catalog;
mod handlers;
pub mod setup;
mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::ErrorResponse;
pub use handlers::upload::{UploadResponse, UPLOAD_PERMISSION};
