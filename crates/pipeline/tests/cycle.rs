use image::{DynamicImage, ImageFormat, RgbImage};
use photoferry_catalog::MarkerResult;
use photoferry_catalog::backend::MockCatalog;
use photoferry_cdn::backend::MockInvalidator;
use photoferry_convert::{ColorMode, Converter, HeifImage, HeifReader};
use photoferry_pipeline::{Pipeline, Response};
use photoferry_storage::StorageBackend;
use photoferry_storage::backend::{MockBackend, Operation};
use serde_json::{Value, json};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use time::Date;
use time::macros::date;

const DAY: Date = date!(2024 - 03 - 07);
const PARTITION: &str = "20240307";
const INDEX: &str = "Json/image.json";

struct FakeHeifReader;
impl HeifReader for FakeHeifReader {
    fn read(&self, _data: &[u8]) -> photoferry_convert::error::Result<HeifImage> {
        Ok(HeifImage {
            mode: ColorMode::Rgb,
            width: 2,
            height: 1,
            data: vec![255, 0, 0, 0, 0, 255],
        })
    }
}

fn png() -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::new(4, 4)).write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn index(entries: Value) -> (&'static str, Vec<u8>) {
    (INDEX, serde_json::to_vec(&entries).unwrap())
}

struct Harness {
    staging: Arc<MockBackend>,
    destination: Arc<MockBackend>,
    catalog: Arc<MockCatalog>,
    cdn: Arc<MockInvalidator>,
}

impl Harness {
    fn new(staging: MockBackend, destination: MockBackend, catalog: MockCatalog) -> Self {
        Self {
            staging: Arc::new(staging),
            destination: Arc::new(destination),
            catalog: Arc::new(catalog),
            cdn: Arc::new(MockInvalidator::default()),
        }
    }

    fn with_cdn(mut self, cdn: MockInvalidator) -> Self {
        self.cdn = Arc::new(cdn);
        self
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.staging.clone(), self.destination.clone(), self.catalog.clone())
            .with_cdn(self.cdn.clone())
            .with_converter(Converter::with_heif_reader(FakeHeifReader))
    }

    async fn index(&self) -> Value {
        serde_json::from_slice(&self.destination.read(Path::new(INDEX)).await.unwrap()).unwrap()
    }
}

fn body(response: &Response) -> String {
    serde_json::from_str(&response.body).unwrap()
}

#[tokio::test]
async fn test_full_cycle() {
    let harness = Harness::new(
        MockBackend::with_files([
            ("a/1.heic", b"ftypheic".to_vec()),
            ("a/2.png", png()),
            ("b/clip.mp4", b"video".to_vec()),
        ]),
        MockBackend::with_files([index(json!([
            {"name": "a", "numImages": 0, "title": "Alps"},
            {"name": "b", "numImages": 5},
            {"name": "c", "numImages": 8},
        ]))]),
        MockCatalog::default().with_places(PARTITION, ["a%2F1.heic", "a%2F2.png", "b%2Fclip.mp4"]),
    );

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response), "Copied and processed 2 of 3 images.");
    assert_eq!(harness.destination.keys().await, vec![
        PathBuf::from(INDEX),
        PathBuf::from("a/1.jpg"),
        PathBuf::from("a/2.jpg"),
    ]);
    assert_eq!(
        harness.index().await,
        json!([
            {"name": "a", "numImages": 2, "title": "Alps"},
            {"name": "b", "numImages": 0},
            {"name": "c", "numImages": 8},
        ])
    );

    let requests = harness.cdn.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].paths, vec!["/*"]);
    assert!(requests[0].caller_reference.parse::<i128>().is_ok());

    let markers = harness.catalog.markers().await;
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].key, "ImageProcessor");
    assert_eq!(markers[0].result, MarkerResult::Success);
    // Staging is read-only.
    assert_eq!(harness.staging.keys().await.len(), 3);
}

#[tokio::test]
async fn test_discovery_failure() {
    let harness = Harness::new(
        MockBackend::with_files([("a/2.png", png())]),
        MockBackend::default(),
        MockCatalog::default().with_places(PARTITION, ["a%2F2.png"]).failing_queries(),
    );

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(response.status_code, 500);
    assert_eq!(body(&response), "Failed to query DynamoDB");
    assert!(harness.catalog.markers().await.is_empty());
    assert!(harness.cdn.requests().await.is_empty());
    assert!(harness.destination.keys().await.is_empty());
}

#[tokio::test]
async fn test_other_failures_still_complete() {
    // Missing source object, undecodable copy, rejected invalidation, no
    // index, failing marker write.
    let harness = Harness::new(
        MockBackend::with_files([("a/broken.png", b"not a png".to_vec())]),
        MockBackend::default(),
        MockCatalog::default().with_places(PARTITION, ["a%2Fgone.png", "a%2Fbroken.png"]).failing_markers(),
    )
    .with_cdn(MockInvalidator::failing());

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response), "Copied and processed 0 of 2 images.");
    assert_eq!(harness.destination.keys().await, vec![PathBuf::from("a/broken.png")]);
}

#[tokio::test]
async fn test_late_step_failures_still_mark_complete() {
    // No index to reconcile and a CDN that rejects the invalidation.
    let harness = Harness::new(
        MockBackend::with_files([("a/2.png", png())]),
        MockBackend::default(),
        MockCatalog::default().with_places(PARTITION, ["a%2F2.png"]),
    )
    .with_cdn(MockInvalidator::failing());

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(response.status_code, 200);
    assert_eq!(body(&response), "Copied and processed 1 of 1 images.");
    assert_eq!(harness.destination.keys().await, vec![PathBuf::from("a/1.jpg")]);
    let markers = harness.catalog.markers().await;
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].result, MarkerResult::Success);
}

#[tokio::test]
async fn test_renumber_failure_is_isolated_per_folder() {
    let harness = Harness::new(
        MockBackend::with_files([("a/x.png", png()), ("b/y.png", png())]),
        MockBackend::with_files([index(json!([{"name": "b", "numImages": 0}]))]).fail_on(Operation::List, "a"),
        MockCatalog::default().with_places(PARTITION, ["a%2Fx.png", "b%2Fy.png"]),
    );

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(body(&response), "Copied and processed 2 of 2 images.");
    assert_eq!(harness.destination.keys().await, vec![
        PathBuf::from(INDEX),
        PathBuf::from("a/x.jpg"),
        PathBuf::from("b/1.jpg"),
    ]);
    assert_eq!(harness.index().await, json!([{"name": "b", "numImages": 1}]));
    assert_eq!(harness.catalog.markers().await.len(), 1);
}

#[tokio::test]
async fn test_marker_written_despite_item_failures() {
    let harness = Harness::new(
        MockBackend::default(),
        MockBackend::with_files([index(json!([]))]),
        MockCatalog::default().with_places(PARTITION, ["a%2Fgone.png"]),
    );

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(body(&response), "Copied and processed 0 of 1 images.");
    assert_eq!(harness.catalog.markers().await.len(), 1);
}

#[tokio::test]
async fn test_undecodable_places_count_towards_total() {
    let harness = Harness::new(
        MockBackend::with_files([("a/2.png", png())]),
        MockBackend::with_files([index(json!([{"name": "a", "numImages": 0}]))]),
        MockCatalog::default().with_places(PARTITION, ["a%2F2.png", "a%2F%FF.png", "..%2F..%2Fescape.png"]),
    );

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(body(&response), "Copied and processed 1 of 3 images.");
    assert_eq!(harness.index().await, json!([{"name": "a", "numImages": 1}]));
}

#[tokio::test]
async fn test_new_uploads_join_existing_sequence() {
    let harness = Harness::new(
        MockBackend::with_files([
            ("trip/IMG_9.png", png()),
            ("trip/Thumbnail/IMG_9.png", png()),
        ]),
        MockBackend::with_files([
            index(json!([{"name": "trip", "numImages": 2}])),
            ("trip/1.jpg", b"one".to_vec()),
            ("trip/2.jpg", b"two".to_vec()),
        ]),
        MockCatalog::default().with_places(PARTITION, ["trip%2FIMG_9.png", "trip%2FThumbnail%2FIMG_9.png"]),
    );

    let response = harness.pipeline().run_for(DAY).await;

    assert_eq!(body(&response), "Copied and processed 2 of 2 images.");
    assert_eq!(harness.destination.keys().await, vec![
        PathBuf::from(INDEX),
        PathBuf::from("trip/1.jpg"),
        PathBuf::from("trip/2.jpg"),
        PathBuf::from("trip/3.jpg"),
        PathBuf::from("trip/Thumbnail/IMG_9.jpg"),
    ]);
    assert_eq!(harness.index().await, json!([{"name": "trip", "numImages": 3}]));
}

#[tokio::test]
async fn test_without_cdn() {
    let staging = Arc::new(MockBackend::with_files([("a/2.png", png())]));
    let destination = Arc::new(MockBackend::with_files([index(json!([]))]));
    let catalog = Arc::new(MockCatalog::default().with_places(PARTITION, ["a%2F2.png"]));
    let pipeline = Pipeline::new(staging, destination.clone(), catalog.clone())
        .with_index_key(INDEX)
        .with_marker_key("Nightly");

    let response = pipeline.run_for(DAY).await;

    assert!(response.is_success());
    assert_eq!(destination.keys().await, vec![PathBuf::from(INDEX), PathBuf::from("a/1.jpg")]);
    assert_eq!(catalog.markers().await[0].key, "Nightly");
}

#[tokio::test]
async fn test_nothing_registered() {
    let harness = Harness::new(
        MockBackend::default(),
        MockBackend::with_files([index(json!([{"name": "a", "numImages": 4}]))]),
        MockCatalog::default().with_places("20240306", ["a%2F1.png"]),
    );

    let response = harness.pipeline().handle(&json!({"source": "aws.events"})).await;

    // `handle` runs for today, which has nothing registered.
    assert_eq!(body(&response), "Copied and processed 0 of 0 images.");
    assert_eq!(harness.index().await, json!([{"name": "a", "numImages": 4}]));
    assert_eq!(harness.catalog.markers().await.len(), 1);
}
