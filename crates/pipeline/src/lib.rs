//! Daily ingestion cycle.
//!
//! Images uploaded to a staging store are registered in a [catalog]
//! partitioned by day. A cycle picks up one day's registrations, publishes
//! each image to the destination store as an RGB JPEG, renumbers the touched
//! folders, invalidates the CDN, refreshes the per-folder image counts in a
//! shared JSON index, and finally records a completion marker.
//!
//! [`Pipeline`] wires the steps together; [`Migrator`], [`renumber`] and
//! [`reconcile`] are usable on their own.
//!
//! [catalog]: photoferry_catalog

mod cycle;
pub mod error;
mod key;
mod migrate;
mod reconcile;
mod renumber;

pub use crate::cycle::{DEFAULT_INDEX_KEY, DEFAULT_MARKER_KEY, Pipeline, Response};
pub use crate::key::{ImageKey, THUMBNAIL_FOLDER, is_thumbnail_folder};
pub use crate::migrate::{Migration, Migrator};
pub use crate::reconcile::{Reconciliation, reconcile};
pub use crate::renumber::{Renumbering, renumber};
