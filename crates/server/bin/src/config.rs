use serde::Deserialize;

/// Server configuration, loaded from `PEDIDOS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_database_url")]
    pub database_url: Option<String>,
    #[serde(default = "default_nats_url")]
    pub nats_url: String,
    #[serde(default = "default_outbox_batch_size")]
    pub outbox_batch_size: usize,
    #[serde(default = "default_outbox_poll_interval_ms")]
    pub outbox_poll_interval_ms: u64,
    #[serde(default = "default_outbox_max_attempts")]
    pub outbox_max_attempts: i32,
}

fn default_database_url() -> Option<String> {
    None
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_outbox_batch_size() -> usize {
    50
}

fn default_outbox_poll_interval_ms() -> u64 {
    500
}

fn default_outbox_max_attempts() -> i32 {
    5
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("PEDIDOS"))
            .build()?
            .try_deserialize()
    }
}
