//! Key-value store access for the ingestion pipeline.
//!
//! The upload side of the system registers every staged object in a table
//! partitioned by day (`YYYYMMDD`), storing the object key URL-encoded in a
//! `place` attribute. Each cycle asks the [`Catalog`] for today's places and,
//! once finished, records a [`CompletionMarker`] in a status table.

pub mod backend;
pub mod error;
mod marker;
mod place;

pub use crate::backend::Catalog;
pub use crate::marker::{CompletionMarker, MarkerResult};
pub use crate::place::{decode_place, partition_key};
use std::sync::Arc;

pub type CatalogHandle = Arc<dyn Catalog + Send + Sync>;
