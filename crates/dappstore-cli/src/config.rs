//! CLI Configuration
//!
//! Layered configuration for the `dappstore` runner: built-in defaults, an
//! optional config file, `config/default` and `config/local`, then
//! `DAPPSTORE__`-prefixed environment variables.

use dappstore_marketplace::{StoreConfig, DEFAULT_EVENT_LOG_CAPACITY};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Marketplace settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Principal allowed to tear the store down
    #[serde(default = "default_administrator")]
    pub administrator: String,

    /// Platform treasury; the administrator when unset
    #[serde(default)]
    pub treasury: Option<String>,

    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            administrator: default_administrator(),
            treasury: None,
            event_log_capacity: default_event_log_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_administrator() -> String {
    "0x0000000000000000000000000000000000000000".to_string()
}

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("DAPPSTORE")
                    .separator("__")
                    .try_parsing(true),
            );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        Ok(app_config)
    }

    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::new(self.store.administrator.as_str())
            .with_event_log_capacity(self.store.event_log_capacity);
        if let Some(treasury) = &self.store.treasury {
            config = config.with_treasury(treasury.as_str());
        }
        config
    }
}
