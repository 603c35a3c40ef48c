//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// ETL and calculation run configuration.
    #[serde(default)]
    pub etl: EtlConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration for the staging/calculation store.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// ETL run configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EtlConfig {
    /// Number of staging rows inserted per transaction.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Minimum seconds between durable-log progress writes for an
    /// unchanged count (write-amplification throttle).
    #[serde(default = "default_progress_interval")]
    pub progress_persist_interval_secs: u64,
    /// Country whose price index applies by default.
    #[serde(default = "default_country")]
    pub default_country_id: i32,
}

fn default_batch_size() -> usize {
    100
}

fn default_progress_interval() -> u64 {
    5
}

fn default_country() -> i32 {
    1 // Mexico
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_persist_interval_secs: default_progress_interval(),
            default_country_id: default_country(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("SAFEHARBOR").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etl_defaults() {
        let etl = EtlConfig::default();
        assert_eq!(etl.batch_size, 100);
        assert_eq!(etl.progress_persist_interval_secs, 5);
        assert_eq!(etl.default_country_id, 1);
    }
}
