use crate::mqtt::broker_config::MqttBrokerConfig;
use common::domain::{DomainError, MessageHandler};
use rumqttc::{AsyncClient, Event, Packet, QoS};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument, Span};

const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Run the MQTT subscription until cancelled
///
/// Subscribes on every ConnAck, so the subscription is restored after each
/// reconnect. Connection errors are logged and polling resumes after the
/// configured delay; rumqttc reconnects on the next poll.
#[instrument(
    name = "mqtt_subscriber",
    skip_all,
    fields(host = %config.host, port = config.port, topic = %config.topic)
)]
pub async fn run_mqtt_subscriber(
    config: MqttBrokerConfig,
    handler: Arc<dyn MessageHandler>,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    info!(tls = config.tls, "connecting to MQTT broker");

    let (client, mut eventloop) = AsyncClient::new(config.mqtt_options(), REQUEST_CHANNEL_CAPACITY);

    loop {
        tokio::select! {
            biased;

            _ = shutdown_token.cancelled() => {
                debug!("shutdown signal received");
                let _ = client.try_disconnect();
                break;
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to MQTT broker, subscribing");
                        if let Err(e) = client.try_subscribe(&config.topic, QoS::AtLeastOnce) {
                            let err = DomainError::MessageSourceError(format!("failed to subscribe: {}", e));
                            error!(error = %err, "subscription request failed");
                        }
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        info!("subscription acknowledged");
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        dispatch_message(
                            Arc::clone(&handler),
                            publish.topic.clone(),
                            publish.payload.to_vec(),
                        )
                        .await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let err = DomainError::MessageSourceError(e.to_string());
                        warn!(
                            error = %err,
                            retry_in = ?config.reconnect_delay,
                            "MQTT connection error"
                        );

                        tokio::select! {
                            _ = shutdown_token.cancelled() => break,
                            _ = tokio::time::sleep(config.reconnect_delay) => {}
                        }
                    }
                }
            }
        }
    }

    info!("MQTT subscriber stopped");
    Ok(())
}

/// Hand one message to the handler in its own task and root span
///
/// Awaiting the task keeps processing sequential while a panic inside the
/// handler only loses this message.
pub(crate) async fn dispatch_message(
    handler: Arc<dyn MessageHandler>,
    topic: String,
    payload: Vec<u8>,
) {
    let span = info_span!(
        parent: Span::none(),
        "mqtt_message",
        topic = %topic,
        payload_size = payload.len(),
    );

    let task = tokio::spawn(
        async move {
            info!("received MQTT message");
            handler.handle(&topic, &payload).await;
        }
        .instrument(span),
    );

    if let Err(e) = task.await {
        error!(error = %e, "message handler panicked, message dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::domain::MockMessageHandler;
    use std::time::Duration;

    struct PanickingHandler;

    #[async_trait]
    impl MessageHandler for PanickingHandler {
        async fn handle(&self, _topic: &str, _payload: &[u8]) {
            panic!("handler blew up");
        }
    }

    #[tokio::test]
    async fn test_dispatch_message_calls_handler() {
        let mut handler = MockMessageHandler::new();
        handler
            .expect_handle()
            .withf(|topic: &str, payload: &[u8]| {
                topic == "openScaleSync/measurements/last" && payload == br#"{"weight":80}"#
            })
            .times(1)
            .returning(|_, _| ());

        dispatch_message(
            Arc::new(handler),
            "openScaleSync/measurements/last".to_string(),
            br#"{"weight":80}"#.to_vec(),
        )
        .await;
    }

    #[tokio::test]
    async fn test_dispatch_message_survives_handler_panic() {
        dispatch_message(
            Arc::new(PanickingHandler),
            "openScaleSync/measurements/last".to_string(),
            b"{}".to_vec(),
        )
        .await;

        // a later message is still delivered
        let mut handler = MockMessageHandler::new();
        handler.expect_handle().times(1).returning(|_, _| ());
        dispatch_message(
            Arc::new(handler),
            "openScaleSync/measurements/last".to_string(),
            b"{}".to_vec(),
        )
        .await;
    }

    #[tokio::test]
    async fn test_subscriber_stops_when_cancelled() {
        let mut handler = MockMessageHandler::new();
        handler.expect_handle().times(0);

        let config = MqttBrokerConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            reconnect_delay: Duration::from_millis(10),
            ..MqttBrokerConfig::default()
        };

        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            run_mqtt_subscriber(config, Arc::new(handler), token),
        )
        .await
        .expect("subscriber should stop after cancellation");
        assert!(result.is_ok());
    }
}
