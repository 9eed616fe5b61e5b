//! Turns a loaded [`Config`] into a ready-to-run [`Pipeline`].

use derive_more::{Display, Error};
use exn::ResultExt;
use photoferry_catalog::CatalogHandle;
use photoferry_cdn::InvalidatorHandle;
use photoferry_config::{CatalogConfig, CdnConfig, Config, StorageTarget};
use photoferry_pipeline::Pipeline;
use photoferry_storage::BackendHandle;
use photoferry_storage::backend::LocalBackend;
use std::sync::Arc;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not set up {_0} storage")]
    Storage(#[error(not(source))] &'static str),
    /// The configured service needs a cargo feature this build lacks.
    #[display("{_0} support is not compiled in (enable the `aws` feature)")]
    Unsupported(#[error(not(source))] &'static str),
}

pub fn pipeline(config: &Config) -> Result<Pipeline> {
    #[cfg(not(feature = "heic"))]
    tracing::warn!("built without the `heic` feature, HEIC uploads will be copied but not converted");
    let staging = storage("staging", &config.staging)?;
    let destination = storage("destination", &config.destination)?;
    let mut pipeline = Pipeline::new(staging, destination, catalog(&config.catalog)?)
        .with_index_key(&config.pipeline.index_key)
        .with_marker_key(&config.pipeline.marker_key);
    if let Some(cdn) = &config.cdn {
        pipeline = pipeline.with_cdn(invalidator(cdn)?);
    }
    Ok(pipeline)
}

fn storage(name: &'static str, target: &StorageTarget) -> Result<BackendHandle> {
    match target {
        StorageTarget::Local { path } => {
            Ok(Arc::new(LocalBackend::new(name, path).or_raise(|| ErrorKind::Storage(name))?))
        },
        #[cfg(feature = "aws")]
        StorageTarget::S3 {
            bucket,
            prefix,
            region,
            endpoint,
            credentials,
        } => Ok(Arc::new(
            photoferry_storage::backend::S3Backend::new(
                name,
                bucket,
                prefix.clone(),
                region,
                endpoint.clone(),
                &credentials.key_id,
                &credentials.key_secret,
            )
            .or_raise(|| ErrorKind::Storage(name))?,
        )),
        #[cfg(not(feature = "aws"))]
        StorageTarget::S3 { .. } => exn::bail!(ErrorKind::Unsupported("s3")),
    }
}

#[cfg(feature = "aws")]
fn catalog(config: &CatalogConfig) -> Result<CatalogHandle> {
    use photoferry_catalog::backend::{DynamoCatalog, Tables};
    let CatalogConfig::DynamoDb {
        region,
        endpoint,
        credentials,
        discovery_table,
        partition_attribute,
        place_attribute,
        status_table,
    } = config;
    let tables = Tables {
        discovery: discovery_table.clone(),
        partition_attribute: partition_attribute.clone(),
        place_attribute: place_attribute.clone(),
        status: status_table.clone(),
    };
    Ok(Arc::new(DynamoCatalog::new(
        "catalog",
        tables,
        region,
        endpoint.clone(),
        &credentials.key_id,
        &credentials.key_secret,
    )))
}

#[cfg(not(feature = "aws"))]
fn catalog(_config: &CatalogConfig) -> Result<CatalogHandle> {
    exn::bail!(ErrorKind::Unsupported("dynamodb"))
}

#[cfg(feature = "aws")]
fn invalidator(config: &CdnConfig) -> Result<InvalidatorHandle> {
    let CdnConfig::CloudFront {
        distribution_id,
        region,
        credentials,
    } = config;
    Ok(Arc::new(photoferry_cdn::backend::CloudFrontInvalidator::new(
        distribution_id,
        region,
        &credentials.key_id,
        &credentials.key_secret,
    )))
}

#[cfg(not(feature = "aws"))]
fn invalidator(_config: &CdnConfig) -> Result<InvalidatorHandle> {
    exn::bail!(ErrorKind::Unsupported("cloudfront"))
}
