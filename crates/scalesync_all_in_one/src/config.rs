use chrono_tz::Tz;
use common::domain::{ApiToken, AttributeNames, DomainError, DomainResult};
use config::{Config, ConfigError, Environment};
use measurement_bridge::exist::{ExistClientConfig, DEFAULT_EXIST_UPDATE_URL};
use measurement_bridge::mqtt::{MqttBrokerConfig, DEFAULT_MEASUREMENT_TOPIC};
use measurement_bridge::MeasurementBridgeConfig;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // MQTT configuration
    /// MQTT broker hostname
    #[serde(default = "default_mqtt_host")]
    pub mqtt_host: String,

    /// MQTT broker port
    #[serde(default = "default_mqtt_port")]
    pub mqtt_port: u16,

    /// Topic carrying openScale measurements
    #[serde(default = "default_mqtt_topic")]
    pub mqtt_topic: String,

    #[serde(default)]
    pub mqtt_username: Option<String>,

    #[serde(default)]
    pub mqtt_password: Option<String>,

    /// Connect over TLS
    #[serde(default)]
    pub mqtt_tls: bool,

    #[serde(default = "default_mqtt_client_id")]
    pub mqtt_client_id: String,

    /// Keep-alive interval; must exceed `exist_timeout_secs` since the
    /// connection is not polled while a message is being submitted
    #[serde(default = "default_mqtt_keep_alive_secs")]
    pub mqtt_keep_alive_secs: u64,

    /// Delay before polling again after a broker error
    #[serde(default = "default_mqtt_reconnect_delay_secs")]
    pub mqtt_reconnect_delay_secs: u64,

    // Exist.io configuration
    /// OAuth2 bearer token with write scope (required)
    #[serde(default)]
    pub exist_token: Option<ApiToken>,

    #[serde(default = "default_exist_update_url")]
    pub exist_update_url: String,

    /// Timeout for one attribute update call
    #[serde(default = "default_exist_timeout_secs")]
    pub exist_timeout_secs: u64,

    /// Exist attribute name for weight
    #[serde(default = "default_attr_weight")]
    pub attr_weight: String,

    /// Exist attribute name for body fat
    #[serde(default = "default_attr_fat")]
    pub attr_fat: String,

    /// IANA timezone measurement dates are resolved in
    #[serde(default = "default_local_tz")]
    pub local_tz: String,

    // OpenTelemetry configuration
    /// OpenTelemetry OTLP endpoint (gRPC)
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default)]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_mqtt_topic() -> String {
    DEFAULT_MEASUREMENT_TOPIC.to_string()
}

fn default_mqtt_client_id() -> String {
    "scalesync-bridge".to_string()
}

fn default_mqtt_keep_alive_secs() -> u64 {
    60
}

fn default_mqtt_reconnect_delay_secs() -> u64 {
    5
}

fn default_exist_update_url() -> String {
    DEFAULT_EXIST_UPDATE_URL.to_string()
}

fn default_exist_timeout_secs() -> u64 {
    30
}

fn default_attr_weight() -> String {
    "weight".to_string()
}

fn default_attr_fat() -> String {
    "body_fat".to_string()
}

fn default_local_tz() -> String {
    "America/Toronto".to_string()
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "scalesync".to_string()
}

impl ServiceConfig {
    /// Load a `.env` file found in the working directory or its parents,
    /// then read the environment
    ///
    /// Variables already set in the process environment win over the file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_after_dotenv(dotenvy::dotenv().map(|_| ()))
    }

    fn load_after_dotenv(dotenv: dotenvy::Result<()>) -> Result<Self, ConfigError> {
        match dotenv {
            Ok(()) => {}
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(ConfigError::Message(format!(
                    "failed to read .env file: {}",
                    e
                )));
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    /// Validate and resolve the settings the bridge runs with
    ///
    /// Fails with `ConfigurationError` on anything that would otherwise only
    /// surface once the first measurement arrives.
    pub fn bridge_config(&self) -> DomainResult<MeasurementBridgeConfig> {
        let token = self
            .exist_token
            .clone()
            .filter(|token| !token.is_blank())
            .ok_or_else(|| {
                DomainError::ConfigurationError(
                    "EXIST_TOKEN is not set; export it or define it in the service environment"
                        .to_string(),
                )
            })?;

        let timezone: Tz = self.local_tz.trim().parse().map_err(|_| {
            DomainError::ConfigurationError(format!(
                "LOCAL_TZ '{}' is not a known IANA timezone",
                self.local_tz
            ))
        })?;

        if self.attr_weight.trim().is_empty() || self.attr_fat.trim().is_empty() {
            return Err(DomainError::ConfigurationError(
                "ATTR_WEIGHT and ATTR_FAT must not be empty".to_string(),
            ));
        }

        if self.exist_timeout_secs == 0 {
            return Err(DomainError::ConfigurationError(
                "EXIST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        if self.mqtt_keep_alive_secs <= self.exist_timeout_secs {
            return Err(DomainError::ConfigurationError(format!(
                "MQTT_KEEP_ALIVE_SECS ({}) must be greater than EXIST_TIMEOUT_SECS ({})",
                self.mqtt_keep_alive_secs, self.exist_timeout_secs
            )));
        }

        Ok(MeasurementBridgeConfig {
            broker: MqttBrokerConfig {
                host: self.mqtt_host.clone(),
                port: self.mqtt_port,
                topic: self.mqtt_topic.clone(),
                client_id: self.mqtt_client_id.clone(),
                username: self.mqtt_username.clone().filter(|u| !u.trim().is_empty()),
                password: self.mqtt_password.clone(),
                tls: self.mqtt_tls,
                keep_alive: Duration::from_secs(self.mqtt_keep_alive_secs),
                reconnect_delay: Duration::from_secs(self.mqtt_reconnect_delay_secs),
            },
            exist: ExistClientConfig {
                update_url: self.exist_update_url.clone(),
                timeout: Duration::from_secs(self.exist_timeout_secs),
            },
            token,
            attribute_names: AttributeNames {
                weight: self.attr_weight.trim().to_string(),
                fat: self.attr_fat.trim().to_string(),
            },
            timezone,
        })
    }
}
