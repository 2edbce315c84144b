use rumqttc::{MqttOptions, Transport};
use std::time::Duration;

pub const DEFAULT_MEASUREMENT_TOPIC: &str = "openScaleSync/measurements/last";

/// Connection settings for the measurement broker
#[derive(Clone)]
pub struct MqttBrokerConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tls: bool,
    pub keep_alive: Duration,
    /// Pause before polling again after a connection error
    pub reconnect_delay: Duration,
}

impl Default for MqttBrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: DEFAULT_MEASUREMENT_TOPIC.to_string(),
            client_id: "scalesync-bridge".to_string(),
            username: None,
            password: None,
            tls: false,
            keep_alive: Duration::from_secs(60),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl MqttBrokerConfig {
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(&self.client_id, &self.host, self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);

        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            options.set_credentials(username, self.password.clone().unwrap_or_default());
        }

        if self.tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        options
    }
}

impl std::fmt::Debug for MqttBrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("topic", &self.topic)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .field("keep_alive", &self.keep_alive)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish()
    }
}
