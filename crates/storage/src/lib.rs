//! Object store access for the ingestion pipeline.
//!
//! Both the staging area and the public destination area are reached through
//! the [`StorageBackend`] trait. Keys are `/`-delimited and always relative
//! to the backend's root (bucket prefix or local directory).

pub mod backend;
pub mod error;
pub mod file;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::file::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
