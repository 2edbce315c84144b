use crate::domain::{DateResolver, MeasurementPipeline, PayloadNormalizer};
use crate::exist::{ExistClient, ExistClientConfig};
use crate::mqtt::{run_mqtt_subscriber, MqttBrokerConfig};
use chrono_tz::Tz;
use common::domain::{ApiToken, AttributeNames, DomainResult, MessageHandler, SystemClock};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Everything the bridge needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct MeasurementBridgeConfig {
    pub broker: MqttBrokerConfig,
    pub exist: ExistClientConfig,
    pub token: ApiToken,
    pub attribute_names: AttributeNames,
    pub timezone: Tz,
}

/// MQTT → Exist.io bridge wired with its production collaborators
pub struct MeasurementBridge {
    broker: MqttBrokerConfig,
    pipeline: Arc<MeasurementPipeline>,
}

impl MeasurementBridge {
    pub fn new(config: MeasurementBridgeConfig) -> DomainResult<Self> {
        debug!(timezone = %config.timezone, "initializing measurement bridge");

        let attribute_store = Arc::new(ExistClient::new(config.exist)?);
        let date_resolver = DateResolver::new(config.timezone, Arc::new(SystemClock));
        let pipeline = Arc::new(MeasurementPipeline::new(
            PayloadNormalizer::new(date_resolver),
            config.attribute_names,
            config.token,
            attribute_store,
        ));

        Ok(Self {
            broker: config.broker,
            pipeline,
        })
    }

    pub fn pipeline(&self) -> Arc<MeasurementPipeline> {
        Arc::clone(&self.pipeline)
    }

    #[allow(clippy::type_complexity)]
    pub fn into_runner_process(
        self,
    ) -> Box<
        dyn FnOnce(
                CancellationToken,
            ) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = anyhow::Result<()>> + Send>,
            > + Send,
    > {
        Box::new(move |ctx| {
            let handler: Arc<dyn MessageHandler> = self.pipeline;
            Box::pin(async move { run_mqtt_subscriber(self.broker, handler, ctx).await })
        })
    }
}
