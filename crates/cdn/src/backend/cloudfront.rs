use crate::{
    Invalidator,
    error::{ErrorKind, Result},
};
use async_trait::async_trait;
use aws_sdk_cloudfront::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    error::SdkError,
    types::{InvalidationBatch, Paths},
};
use exn::ResultExt;

/// CloudFront distribution invalidation.
#[derive(Debug, Clone)]
pub struct CloudFrontInvalidator {
    client: Client,
    distribution_id: String,
}

impl CloudFrontInvalidator {
    pub fn new(
        distribution_id: impl Into<String>,
        region: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "photoferry-config");
        let config = aws_sdk_cloudfront::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .build();
        Self::from_client(Client::from_conf(config), distribution_id)
    }

    pub fn from_client(client: Client, distribution_id: impl Into<String>) -> Self {
        Self {
            client,
            distribution_id: distribution_id.into(),
        }
    }
}

#[async_trait]
impl Invalidator for CloudFrontInvalidator {
    fn name(&self) -> &str {
        &self.distribution_id
    }

    async fn invalidate(&self, paths: &[&str], caller_reference: &str) -> Result<String> {
        let items: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        let quantity = i32::try_from(items.len()).or_raise(|| ErrorKind::Request)?;
        let paths = Paths::builder()
            .quantity(quantity)
            .set_items(Some(items))
            .build()
            .or_raise(|| ErrorKind::Request)?;
        let batch = InvalidationBatch::builder()
            .paths(paths)
            .caller_reference(caller_reference)
            .build()
            .or_raise(|| ErrorKind::Request)?;
        let output = self
            .client
            .create_invalidation()
            .distribution_id(&self.distribution_id)
            .invalidation_batch(batch)
            .send()
            .await
            .map_err(|err| {
                let kind = match &err {
                    SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Network(err.to_string()),
                    _ => ErrorKind::Rejected(self.distribution_id.clone()),
                };
                exn::Exn::from(err).raise(kind)
            })?;
        let id = output.invalidation().map(|i| i.id().to_string()).unwrap_or_default();
        tracing::debug!(distribution = %self.distribution_id, id, "created invalidation");
        Ok(id)
    }
}
