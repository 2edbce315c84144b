mod config;

use crate::config::ServiceConfig;
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig, TelemetryProviders};
use measurement_bridge::MeasurementBridge;
use scalesync_runner::Runner;
use std::time::Duration;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let telemetry_providers: Option<TelemetryProviders> = match init_telemetry(&TelemetryConfig {
        service_name: config.otel_service_name.clone(),
        otel_endpoint: config.otel_endpoint.clone(),
        otel_enabled: config.otel_enabled,
        log_level: config.log_level.clone(),
    }) {
        Ok(providers) => providers,
        Err(e) => {
            eprintln!("Failed to initialize telemetry: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        otel_enabled = config.otel_enabled,
        mqtt_host = %config.mqtt_host,
        mqtt_port = config.mqtt_port,
        mqtt_topic = %config.mqtt_topic,
        mqtt_tls = config.mqtt_tls,
        "Starting scalesync bridge"
    );
    debug!("Configuration: {:?}", config);

    let bridge = match config
        .bridge_config()
        .and_then(MeasurementBridge::new)
    {
        Ok(bridge) => bridge,
        Err(e) => {
            error!(error = %e, "Refusing to start");
            eprintln!("{}", e);
            shutdown_telemetry(telemetry_providers);
            std::process::exit(1);
        }
    };

    let exit_code = Runner::new()
        .with_named_process("mqtt_bridge", bridge.into_runner_process())
        .with_closer(move || async move {
            info!("Flushing telemetry");
            shutdown_telemetry(telemetry_providers);
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;

    std::process::exit(exit_code);
}
