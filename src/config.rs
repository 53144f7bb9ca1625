use crate::error::{LoaderError, Result};
use crate::utils::constants::{
    DEFAULT_BATCH_LATENCY_MS, DEFAULT_BATCH_ROWS, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_SCHEMA, DEFAULT_TABLE, DEFAULT_WRITE_RETRIES,
};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration, layered from defaults, an optional config file,
/// `QCLCD_*` environment variables, and finally CLI flag overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    pub database_url: String,
    pub schema: String,
    pub table: String,
    pub max_batch_rows: usize,
    pub max_batch_latency_ms: u64,
    pub max_connections: u32,
    pub write_retries: u32,
    pub retry_backoff_ms: u64,
}

impl LoaderConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("database_url", "postgres://localhost:5432/weather")?
            .set_default("schema", DEFAULT_SCHEMA)?
            .set_default("table", DEFAULT_TABLE)?
            .set_default("max_batch_rows", DEFAULT_BATCH_ROWS as u64)?
            .set_default("max_batch_latency_ms", DEFAULT_BATCH_LATENCY_MS)?
            .set_default("max_connections", DEFAULT_MAX_CONNECTIONS as u64)?
            .set_default("write_retries", DEFAULT_WRITE_RETRIES as u64)?
            .set_default("retry_backoff_ms", DEFAULT_RETRY_BACKOFF_MS)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("QCLCD").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_batch_rows == 0 {
            return Err(LoaderError::Config(
                "max_batch_rows must be at least 1".to_string(),
            ));
        }
        if self.max_batch_latency_ms == 0 {
            return Err(LoaderError::Config(
                "max_batch_latency_ms must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(LoaderError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn batch_latency(&self) -> Duration {
        Duration::from_millis(self.max_batch_latency_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
