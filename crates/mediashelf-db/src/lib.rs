//! Database repositories
//!
//! Postgres implementations of the storage-agnostic traits in `mediashelf-collections`.

pub mod db;

pub use db::{MediaRepository, MediaRow};
