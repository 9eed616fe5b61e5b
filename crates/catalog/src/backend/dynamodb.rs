//! DynamoDB catalog.
//!
//! Discovery reads one partition of the registration table; the completion
//! marker is a single item in the status table.

use crate::{
    Catalog, CompletionMarker,
    error::{Error, ErrorKind, Result},
};
use async_trait::async_trait;
use aws_sdk_dynamodb::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::SdkError,
    types::AttributeValue,
};
use std::collections::HashMap;

/// Table and attribute names used by [`DynamoCatalog`].
#[derive(Debug, Clone)]
pub struct Tables {
    /// Table holding one item per uploaded object.
    pub discovery: String,
    /// Partition attribute of the discovery table (`YYYYMMDD`).
    pub partition_attribute: String,
    /// Attribute holding the URL-encoded object key.
    pub place_attribute: String,
    /// Table receiving the completion marker.
    pub status: String,
}

/// Catalog backed by DynamoDB.
///
/// # Examples
///
/// ```no_run
/// use photoferry_catalog::backend::{DynamoCatalog, Tables};
///
/// let tables = Tables {
///     discovery: "image_place".to_string(),
///     partition_attribute: "timestamp".to_string(),
///     place_attribute: "place".to_string(),
///     status: "last_updated".to_string(),
/// };
/// let catalog = DynamoCatalog::new("catalog", tables, "us-east-1", None::<String>, "key_id", "key_secret");
/// ```
#[derive(Debug, Clone)]
pub struct DynamoCatalog {
    name: String,
    client: Client,
    tables: Tables,
}

impl DynamoCatalog {
    pub fn new(
        name: impl Into<String>,
        tables: Tables,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "photoferry-config");
        let mut config_builder = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            .retry_config(RetryConfig::standard().with_max_attempts(4));
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Self::from_client(name, Client::from_conf(config_builder.build()), tables)
    }

    pub fn from_client(name: impl Into<String>, client: Client, tables: Tables) -> Self {
        Self {
            name: name.into(),
            client,
            tables,
        }
    }

    fn map_sdk_error<E, R>(err: SdkError<E, R>, fallback: ErrorKind) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let kind = match &err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Network(err.to_string()),
            _ => fallback,
        };
        exn::Exn::from(err).raise(kind)
    }
}

/// Place values of a page of items, skipping items that lack one.
fn extract_places(items: &[HashMap<String, AttributeValue>], attribute: &str) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| item.get(attribute))
        .filter_map(|value| value.as_s().ok())
        .cloned()
        .collect()
}

#[async_trait]
impl Catalog for DynamoCatalog {
    fn name(&self) -> &str {
        &self.name
    }

    async fn places(&self, partition: &str) -> Result<Vec<String>> {
        let mut places = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        loop {
            let output = self
                .client
                .query()
                .table_name(&self.tables.discovery)
                .key_condition_expression("#pk = :pk")
                .expression_attribute_names("#pk", &self.tables.partition_attribute)
                .expression_attribute_names("#place", &self.tables.place_attribute)
                .expression_attribute_values(":pk", AttributeValue::S(partition.to_string()))
                .projection_expression("#place")
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| Self::map_sdk_error(e, ErrorKind::Query(self.tables.discovery.clone())))?;
            places.extend(extract_places(output.items(), &self.tables.place_attribute));
            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        tracing::debug!(table = %self.tables.discovery, partition, count = places.len(), "queried discovery table");
        Ok(places)
    }

    async fn put_marker(&self, marker: &CompletionMarker) -> Result<()> {
        let timestamp = marker.timestamp_string()?;
        self.client
            .put_item()
            .table_name(&self.tables.status)
            .item("key", AttributeValue::S(marker.key.clone()))
            .item("Result", AttributeValue::S(marker.result.to_string()))
            .item("Timestamp", AttributeValue::S(timestamp))
            .send()
            .await
            .map_err(|e| Self::map_sdk_error(e, ErrorKind::Write(self.tables.status.clone())))?;
        Ok(())
    }
}
