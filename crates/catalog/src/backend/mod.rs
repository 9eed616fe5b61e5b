//! Catalog trait and implementations.

#[cfg(feature = "dynamodb")]
mod dynamodb;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "dynamodb")]
pub use self::dynamodb::{DynamoCatalog, Tables};
#[cfg(feature = "mock")]
pub use self::mock::MockCatalog;
use crate::error::Result;
use crate::marker::CompletionMarker;
use async_trait::async_trait;

/// Key-value store consulted at the start and end of every cycle.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Name of the configured catalog, for logging.
    fn name(&self) -> &str;

    /// Every `place` registered under `partition`, still URL-encoded, in
    /// store order. Entries without a `place` are left out.
    async fn places(&self, partition: &str) -> Result<Vec<String>>;

    /// Write `marker`, replacing any previous marker with the same key.
    async fn put_marker(&self, marker: &CompletionMarker) -> Result<()>;
}
