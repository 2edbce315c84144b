mod broker_config;
mod subscriber;

pub use broker_config::*;
pub use subscriber::run_mqtt_subscriber;
