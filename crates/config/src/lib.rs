//! Configuration for photoferry.
//!
//! Values are layered: built-in defaults, then an optional config file
//! (TOML, YAML or JSON), then `PHOTOFERRY_*` environment variables.

pub mod error;
mod load;
mod types;

pub use crate::load::{ENV_PREFIX, default_path};
pub use crate::types::{CatalogConfig, CdnConfig, Config, Credentials, PipelineSettings, StorageTarget};
