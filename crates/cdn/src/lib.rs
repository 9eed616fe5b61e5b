//! Edge cache invalidation.
//!
//! After a cycle rewrites objects in the serving store, the CDN in front of
//! it is told to drop its cached copies so clients see the new state.

pub mod backend;
pub mod error;

pub use crate::backend::Invalidator;
use std::sync::Arc;

/// Path pattern covering every object behind a distribution.
pub const INVALIDATE_ALL: &str = "/*";

pub type InvalidatorHandle = Arc<dyn Invalidator + Send + Sync>;
