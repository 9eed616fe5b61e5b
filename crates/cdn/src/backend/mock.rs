//! Recording invalidator for testing.

use crate::Invalidator;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// A request received by [`MockInvalidator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationRequest {
    pub paths: Vec<String>,
    pub caller_reference: String,
}

/// Records every invalidation request instead of sending it.
#[derive(Debug, Default)]
pub struct MockInvalidator {
    requests: Mutex<Vec<InvalidationRequest>>,
    fail: bool,
}

impl MockInvalidator {
    /// Reject every request.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub async fn requests(&self) -> Vec<InvalidationRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl Invalidator for MockInvalidator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn invalidate(&self, paths: &[&str], caller_reference: &str) -> Result<String> {
        if self.fail {
            exn::bail!(ErrorKind::Rejected("mock".to_string()));
        }
        let mut requests = self.requests.lock().await;
        requests.push(InvalidationRequest {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            caller_reference: caller_reference.to_string(),
        });
        Ok(format!("MOCK{}", requests.len()))
    }
}
