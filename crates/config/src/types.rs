use crate::error::{ErrorKind, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Where uploads land before processing.
    pub staging: StorageTarget,
    /// Serving store: converted images, renumbered folders and the index.
    pub destination: StorageTarget,
    pub catalog: CatalogConfig,
    /// Cache invalidation is skipped when unset.
    #[serde(default)]
    pub cdn: Option<CdnConfig>,
    #[serde(default)]
    pub pipeline: PipelineSettings,
}

/// Explicit access credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: String,
}
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageTarget {
    S3 {
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(flatten)]
        credentials: Credentials,
    },
    Local {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CatalogConfig {
    DynamoDb {
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(flatten)]
        credentials: Credentials,
        discovery_table: String,
        #[serde(default = "default_partition_attribute")]
        partition_attribute: String,
        #[serde(default = "default_place_attribute")]
        place_attribute: String,
        #[serde(default = "default_status_table")]
        status_table: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CdnConfig {
    CloudFront {
        distribution_id: String,
        #[serde(default = "default_cdn_region")]
        region: String,
        #[serde(flatten)]
        credentials: Credentials,
    },
}

/// Names the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PipelineSettings {
    /// Destination key of the folder count index.
    #[serde(default = "default_index_key")]
    pub index_key: String,
    /// Key of the completion marker item.
    #[serde(default = "default_marker_key")]
    pub marker_key: String,
}
impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            index_key: default_index_key(),
            marker_key: default_marker_key(),
        }
    }
}

fn default_partition_attribute() -> String {
    "timestamp".to_string()
}
fn default_place_attribute() -> String {
    "place".to_string()
}
fn default_status_table() -> String {
    "last_updated".to_string()
}
fn default_cdn_region() -> String {
    "us-east-1".to_string()
}
fn default_index_key() -> String {
    "Json/image.json".to_string()
}
fn default_marker_key() -> String {
    "ImageProcessor".to_string()
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        exn::bail!(ErrorKind::Invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

impl StorageTarget {
    fn validate(&self, section: &str) -> Result<()> {
        match self {
            Self::S3 {
                bucket,
                region,
                credentials,
                ..
            } => {
                require(&format!("{section}.bucket"), bucket)?;
                require(&format!("{section}.region"), region)?;
                credentials.validate(section)
            },
            Self::Local { path } if !path.is_absolute() => exn::bail!(ErrorKind::Invalid(format!(
                "{section}.path must be absolute, got {}",
                path.display()
            ))),
            Self::Local { .. } => Ok(()),
        }
    }
}

impl Credentials {
    fn validate(&self, section: &str) -> Result<()> {
        require(&format!("{section}.key_id"), &self.key_id)?;
        require(&format!("{section}.key_secret"), &self.key_secret)
    }
}

impl Config {
    /// Reject values that would only fail once a cycle is underway.
    pub fn validate(&self) -> Result<()> {
        self.staging.validate("staging")?;
        self.destination.validate("destination")?;
        match &self.catalog {
            CatalogConfig::DynamoDb {
                region,
                credentials,
                discovery_table,
                partition_attribute,
                place_attribute,
                status_table,
                ..
            } => {
                require("catalog.region", region)?;
                credentials.validate("catalog")?;
                require("catalog.discovery_table", discovery_table)?;
                require("catalog.partition_attribute", partition_attribute)?;
                require("catalog.place_attribute", place_attribute)?;
                require("catalog.status_table", status_table)?;
            },
        }
        if let Some(CdnConfig::CloudFront {
            distribution_id,
            credentials,
            ..
        }) = &self.cdn
        {
            require("cdn.distribution_id", distribution_id)?;
            credentials.validate("cdn")?;
        }
        require("pipeline.index_key", &self.pipeline.index_key)?;
        require("pipeline.marker_key", &self.pipeline.marker_key)?;
        Ok(())
    }
}
