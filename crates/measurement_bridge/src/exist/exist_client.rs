use async_trait::async_trait;
use common::domain::{
    ApiToken, AttributeStore, AttributeUpdate, DomainError, DomainResult, UpdateReceipt,
};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_EXIST_UPDATE_URL: &str = "https://exist.io/api/2/attributes/update/";

const MAX_LOGGED_BODY_CHARS: usize = 300;

#[derive(Debug, Clone)]
pub struct ExistClientConfig {
    /// Attribute update endpoint
    pub update_url: String,
    /// Upper bound for one update call, connect to last byte
    pub timeout: Duration,
}

impl Default for ExistClientConfig {
    fn default() -> Self {
        Self {
            update_url: DEFAULT_EXIST_UPDATE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Exist.io attribute update client
pub struct ExistClient {
    http: reqwest::Client,
    update_url: String,
}

impl ExistClient {
    pub fn new(config: ExistClientConfig) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::ConfigurationError(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            update_url: config.update_url,
        })
    }
}

#[async_trait]
impl AttributeStore for ExistClient {
    async fn update_attributes(
        &self,
        token: &ApiToken,
        updates: &[AttributeUpdate],
    ) -> DomainResult<UpdateReceipt> {
        debug!(url = %self.update_url, update_count = updates.len(), "posting attribute updates");

        let response = self
            .http
            .post(&self.update_url)
            .bearer_auth(token.expose())
            .json(updates)
            .send()
            .await
            .map_err(|e| DomainError::AttributeStoreUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::AttributeStoreUnavailable(e.to_string()))?;

        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            return Err(DomainError::UpdateRejected {
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_LOGGED_BODY_CHARS),
            });
        }

        let response = serde_json::from_str(&body).unwrap_or_else(|_| {
            serde_json::Value::String(truncate_chars(&body, MAX_LOGGED_BODY_CHARS))
        });

        Ok(UpdateReceipt {
            status: status.as_u16(),
            response,
        })
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
