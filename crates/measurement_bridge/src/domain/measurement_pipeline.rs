use crate::domain::payload_normalizer::PayloadNormalizer;
use crate::domain::update_mapper::to_updates;
use async_trait::async_trait;
use common::domain::{
    ApiToken, AttributeNames, AttributeStore, DomainResult, MessageHandler, UpdateReceipt,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives one message through normalize → map → submit
///
/// Delivery is at-most-once: a message that fails at any step is logged and
/// dropped, and the next message is processed normally.
pub struct MeasurementPipeline {
    normalizer: PayloadNormalizer,
    attribute_names: AttributeNames,
    token: ApiToken,
    attribute_store: Arc<dyn AttributeStore>,
}

impl MeasurementPipeline {
    pub fn new(
        normalizer: PayloadNormalizer,
        attribute_names: AttributeNames,
        token: ApiToken,
        attribute_store: Arc<dyn AttributeStore>,
    ) -> Self {
        Self {
            normalizer,
            attribute_names,
            token,
            attribute_store,
        }
    }

    /// Normalize a payload and submit its updates, surfacing any failure
    pub async fn process(&self, payload: &str) -> DomainResult<UpdateReceipt> {
        let record = self.normalizer.normalize(payload)?;
        info!(
            date = %record.date,
            weight_kg = record.weight_kg,
            fat_fraction = ?record.fat_fraction,
            "parsed measurement"
        );

        let updates = to_updates(&record, &self.attribute_names);
        info!(
            update_count = updates.len(),
            updates = ?updates,
            "submitting attribute updates"
        );

        self.attribute_store
            .update_attributes(&self.token, &updates)
            .await
    }
}

#[async_trait]
impl MessageHandler for MeasurementPipeline {
    async fn handle(&self, topic: &str, payload: &[u8]) {
        let text = String::from_utf8_lossy(payload);
        debug!(topic = %topic, payload = %text, "received measurement payload");

        match self.process(&text).await {
            Ok(receipt) => {
                info!(
                    status = receipt.status,
                    response = %receipt.response,
                    "attribute updates accepted"
                );
                for failed in receipt.failed_updates() {
                    warn!(failed = %failed, "attribute store refused an update");
                }
            }
            Err(e) if e.is_payload_error() => {
                warn!(error = %e, "discarding unprocessable measurement");
            }
            Err(e) => {
                error!(error = %e, "attribute update failed, measurement dropped");
            }
        }
    }
}
