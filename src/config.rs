use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Lookback windows for the metrics computation pass.
///
/// The suggestion and session windows are independent: trust/risk metrics
/// look further back than engagement metrics.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Days of suggestion/result history to read
    #[serde(default = "default_suggestion_lookback_days")]
    pub suggestion_lookback_days: i64,
    /// Days of message/session history to read
    #[serde(default = "default_session_lookback_days")]
    pub session_lookback_days: i64,
}

fn default_suggestion_lookback_days() -> i64 {
    180
}

fn default_session_lookback_days() -> i64 {
    90
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            suggestion_lookback_days: default_suggestion_lookback_days(),
            session_lookback_days: default_session_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .set_default("engine.suggestion_lookback_days", 180)?
            .set_default("engine.session_lookback_days", 90)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("MAX_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (MAX_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("MAX")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.url.is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if self.database.max_connections == 0 {
            errors.push("database.max_connections must be positive".to_string());
        }

        if self.engine.suggestion_lookback_days <= 0 {
            errors.push("engine.suggestion_lookback_days must be positive".to_string());
        }

        if self.engine.session_lookback_days <= 0 {
            errors.push("engine.session_lookback_days must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
