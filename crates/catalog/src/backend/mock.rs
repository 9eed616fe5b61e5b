//! In-memory catalog for testing.

use crate::Catalog;
use crate::error::{ErrorKind, Result};
use crate::marker::CompletionMarker;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory catalog for testing.
///
/// Holds places per partition and keeps every marker written, latest last,
/// so tests can assert on both the overwrite and the write count.
///
/// # Examples
///
/// ```
/// use photoferry_catalog::Catalog;
/// use photoferry_catalog::backend::MockCatalog;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let catalog = MockCatalog::default().with_places("20240307", ["trip%2F1.heic"]);
/// assert_eq!(catalog.places("20240307").await?, vec!["trip%2F1.heic"]);
/// assert!(catalog.places("20240308").await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockCatalog {
    partitions: HashMap<String, Vec<String>>,
    markers: RwLock<Vec<CompletionMarker>>,
    fail_queries: bool,
    fail_markers: bool,
}

impl MockCatalog {
    pub fn with_places(mut self, partition: impl Into<String>, places: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.partitions.entry(partition.into()).or_default().extend(places.into_iter().map(Into::into));
        self
    }

    /// Make every discovery query fail.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Make every marker write fail.
    pub fn failing_markers(mut self) -> Self {
        self.fail_markers = true;
        self
    }

    /// Every marker written so far, oldest first.
    pub async fn markers(&self) -> Vec<CompletionMarker> {
        self.markers.read().await.clone()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn places(&self, partition: &str) -> Result<Vec<String>> {
        if self.fail_queries {
            exn::bail!(ErrorKind::Query("mock".to_string()));
        }
        Ok(self.partitions.get(partition).cloned().unwrap_or_default())
    }

    async fn put_marker(&self, marker: &CompletionMarker) -> Result<()> {
        if self.fail_markers {
            exn::bail!(ErrorKind::Write("mock".to_string()));
        }
        self.markers.write().await.push(marker.clone());
        Ok(())
    }
}
