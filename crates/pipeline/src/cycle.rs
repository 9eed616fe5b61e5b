use crate::error::{ErrorKind, Result};
use crate::key::{ImageKey, is_thumbnail_folder};
use crate::migrate::{Migration, Migrator};
use crate::reconcile::reconcile;
use crate::renumber::renumber;
use exn::ResultExt;
use photoferry_catalog::{CatalogHandle, CompletionMarker, decode_place, partition_key};
use photoferry_cdn::{INVALIDATE_ALL, InvalidatorHandle};
use photoferry_convert::Converter;
use photoferry_storage::BackendHandle;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use time::{Date, OffsetDateTime};

/// Default key of the folder index in the destination store.
pub const DEFAULT_INDEX_KEY: &str = "Json/image.json";
/// Default key of the completion marker.
pub const DEFAULT_MARKER_KEY: &str = "ImageProcessor";
const DISCOVERY_FAILED: &str = "Failed to query DynamoDB";

/// Result of one cycle, in the shape the trigger expects.
///
/// `body` holds a JSON-encoded string, so the serialized response reads
/// `{"statusCode":200,"body":"\"Copied and processed 2 of 3 images.\""}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Response {
    fn new(status_code: u16, message: String) -> Self {
        Self {
            status_code,
            body: serde_json::Value::String(message).to_string(),
        }
    }

    fn success(converted: usize, total: usize) -> Self {
        Self::new(200, format!("Copied and processed {converted} of {total} images."))
    }

    fn discovery_failed() -> Self {
        Self::new(500, DISCOVERY_FAILED.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Keys found by discovery.
struct Discovery {
    keys: Vec<ImageKey>,
    /// Every registered place, including ones that didn't decode.
    total: usize,
}

/// One ingestion cycle over a day's uploads.
///
/// ```text
/// Discover -> Migrate(*) -> DeriveFolders -> Renumber(*) -> Invalidate -> Reconcile -> MarkComplete
/// ```
///
/// Only discovery can fail a cycle. Every later step logs its failures and
/// lets the cycle carry on, so a completed cycle always writes its marker.
pub struct Pipeline {
    staging: BackendHandle,
    destination: BackendHandle,
    catalog: CatalogHandle,
    cdn: Option<InvalidatorHandle>,
    converter: Converter,
    index_key: PathBuf,
    marker_key: String,
}

impl Pipeline {
    pub fn new(staging: BackendHandle, destination: BackendHandle, catalog: CatalogHandle) -> Self {
        Self {
            staging,
            destination,
            catalog,
            cdn: None,
            converter: Converter::default(),
            index_key: PathBuf::from(DEFAULT_INDEX_KEY),
            marker_key: DEFAULT_MARKER_KEY.to_string(),
        }
    }

    pub fn with_cdn(mut self, cdn: InvalidatorHandle) -> Self {
        self.cdn = Some(cdn);
        self
    }

    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_index_key(mut self, key: impl Into<PathBuf>) -> Self {
        self.index_key = key.into();
        self
    }

    pub fn with_marker_key(mut self, key: impl Into<String>) -> Self {
        self.marker_key = key.into();
        self
    }

    /// Run a cycle for today's UTC date in response to a trigger event. The
    /// event's content is not used.
    pub async fn handle(&self, event: &serde_json::Value) -> Response {
        tracing::debug!(%event, "received trigger");
        self.run_for(OffsetDateTime::now_utc().date()).await
    }

    /// Run a cycle for the uploads registered on `date`.
    pub async fn run_for(&self, date: Date) -> Response {
        let Discovery { keys, total } = match self.discover(date).await {
            Ok(discovery) => discovery,
            Err(err) => {
                tracing::error!(?err, "discovery failed");
                return Response::discovery_failed();
            },
        };
        tracing::info!(count = total, %date, "discovered uploads");

        let converted = self.migrate_all(&keys).await;

        let (parents, top_levels) = folders(&keys);
        for folder in &parents {
            if is_thumbnail_folder(folder) {
                tracing::info!(folder = %folder.display(), "skipping thumbnail folder");
                continue;
            }
            match renumber(&self.destination, folder).await {
                Ok(summary) => tracing::info!(
                    folder = %folder.display(),
                    renamed = summary.renamed,
                    unchanged = summary.unchanged,
                    "renumbered"
                ),
                Err(err) => tracing::error!(?err, folder = %folder.display(), "renumbering failed"),
            }
        }

        if let Err(err) = self.invalidate().await {
            tracing::error!(?err, "cache invalidation failed");
        }

        match reconcile(&self.destination, &self.index_key, &top_levels).await {
            Ok(summary) => tracing::info!(index = %self.index_key.display(), updated = summary.updated, "index updated"),
            Err(err) => tracing::error!(?err, index = %self.index_key.display(), "index update failed"),
        }

        if let Err(err) = self.mark_complete().await {
            tracing::error!(?err, "writing completion marker failed");
        }

        Response::success(converted, total)
    }

    async fn discover(&self, date: Date) -> Result<Discovery> {
        let partition = partition_key(date).or_raise(|| ErrorKind::Discovery)?;
        let places = self.catalog.places(&partition).await.or_raise(|| ErrorKind::Discovery)?;
        let total = places.len();
        let keys = places
            .iter()
            .filter_map(|place| match parse_place(place) {
                Ok(key) => Some(key),
                Err(err) => {
                    tracing::warn!(?err, place, "dropping undecodable place");
                    None
                },
            })
            .collect();
        Ok(Discovery { keys, total })
    }

    /// Migrate every non-video key, returning how many converted.
    async fn migrate_all(&self, keys: &[ImageKey]) -> usize {
        let migrator = Migrator::new(self.staging.clone(), self.destination.clone(), self.converter.clone());
        let mut converted = 0;
        for key in keys {
            if key.is_video() {
                tracing::info!(%key, "skipping video");
                continue;
            }
            match migrator.migrate(key).await {
                Migration::Converted { .. } => converted += 1,
                Migration::Skipped => tracing::info!(%key, "left as-is"),
                Migration::Unconverted(err) => tracing::warn!(?err, %key, "conversion failed, copy retained"),
                Migration::Failed(err) => tracing::error!(?err, %key, "migration failed"),
            }
        }
        converted
    }

    async fn invalidate(&self) -> Result<()> {
        let Some(cdn) = &self.cdn else {
            tracing::info!("no CDN configured, skipping invalidation");
            return Ok(());
        };
        let caller_reference = OffsetDateTime::now_utc().unix_timestamp_nanos().to_string();
        let id = cdn.invalidate(&[INVALIDATE_ALL], &caller_reference).await.or_raise(|| ErrorKind::Invalidation)?;
        tracing::info!(distribution = cdn.name(), id, "invalidation created");
        Ok(())
    }

    async fn mark_complete(&self) -> Result<()> {
        let marker = CompletionMarker::success(&self.marker_key, OffsetDateTime::now_utc());
        self.catalog.put_marker(&marker).await.or_raise(|| ErrorKind::Marker)
    }
}

fn parse_place(place: &str) -> Result<ImageKey> {
    let decoded = decode_place(place).or_raise(|| ErrorKind::InvalidKey(place.to_string()))?;
    ImageKey::new(decoded)
}

/// Distinct parent folders and distinct non-empty top-level folders, sorted.
fn folders(keys: &[ImageKey]) -> (BTreeSet<PathBuf>, BTreeSet<String>) {
    let parents = keys.iter().map(|key| key.parent_folder().to_path_buf()).collect();
    let top_levels = keys.iter().filter_map(ImageKey::top_level_folder).collect();
    (parents, top_levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_response_serialization() {
        let response = Response::success(2, 3);
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":200,"body":"\"Copied and processed 2 of 3 images.\""}"#
        );
        let failure = Response::discovery_failed();
        assert!(!failure.is_success());
        assert_eq!(failure.status_code, 500);
        assert_eq!(failure.body, r#""Failed to query DynamoDB""#);
    }

    #[test]
    fn test_folders() {
        let keys: Vec<ImageKey> = ["b/x/1.jpg", "a/2.png", "a/1.heic", "root.jpg", "b/thumbnail/1.jpg"]
            .into_iter()
            .map(|k| ImageKey::new(k).unwrap())
            .collect();
        let (parents, top_levels) = folders(&keys);
        assert_eq!(parents.iter().map(PathBuf::as_path).collect::<Vec<_>>(), vec![
            Path::new(""),
            Path::new("a"),
            Path::new("b/thumbnail"),
            Path::new("b/x"),
        ]);
        assert_eq!(top_levels.into_iter().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_parse_place() {
        assert_eq!(parse_place("my+trip%2F1.heic").unwrap(), ImageKey::new("my trip/1.heic").unwrap());
        assert!(matches!(&*parse_place("%FF.jpg").unwrap_err(), ErrorKind::InvalidKey(_)));
        assert!(matches!(&*parse_place("..%2Fescape.jpg").unwrap_err(), ErrorKind::InvalidKey(_)));
        assert!(matches!(&*parse_place("a%2F%2Fb.png").unwrap_err(), ErrorKind::InvalidKey(_)));
        assert!(matches!(&*parse_place("a%2Fx%2F..%2Fb.png").unwrap_err(), ErrorKind::InvalidKey(_)));
    }
}
