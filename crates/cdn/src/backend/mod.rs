#[cfg(feature = "cloudfront")]
mod cloudfront;
#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "cloudfront")]
pub use self::cloudfront::CloudFrontInvalidator;
#[cfg(feature = "mock")]
pub use self::mock::{InvalidationRequest, MockInvalidator};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Invalidator: Send + Sync {
    /// Distribution being invalidated, for logging.
    fn name(&self) -> &str;

    /// Request invalidation of `paths`.
    ///
    /// `caller_reference` must be unique per request; repeating one replays
    /// the earlier request instead of creating a new invalidation. Returns
    /// the invalidation ID assigned by the CDN.
    async fn invalidate(&self, paths: &[&str], caller_reference: &str) -> Result<String>;
}
