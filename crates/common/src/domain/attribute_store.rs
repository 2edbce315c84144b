use crate::domain::measurement::{ApiToken, AttributeUpdate};
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Acknowledgement returned by the attribute store for an accepted update call
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReceipt {
    /// HTTP status (200 or 202)
    pub status: u16,
    /// Response body, as JSON when the store returned JSON
    pub response: serde_json::Value,
}

impl UpdateReceipt {
    /// Entries the store listed under `failed` despite accepting the call
    pub fn failed_updates(&self) -> Vec<&serde_json::Value> {
        self.response
            .get("failed")
            .and_then(|failed| failed.as_array())
            .map(|failed| failed.iter().collect())
            .unwrap_or_default()
    }
}

/// Trait for submitting attribute updates to the downstream tracking API
///
/// Implementations should:
/// - Send all updates of one measurement in a single authenticated call
/// - Return UpdateRejected for any status other than 200/202
/// - Return AttributeStoreUnavailable for transport errors and timeouts
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AttributeStore: Send + Sync {
    /// Submit an ordered batch of updates
    ///
    /// # Arguments
    /// * `token` - Bearer token with write scope
    /// * `updates` - Updates for a single measurement, weight first
    async fn update_attributes(
        &self,
        token: &ApiToken,
        updates: &[AttributeUpdate],
    ) -> DomainResult<UpdateReceipt>;
}
