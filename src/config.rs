//! Application configuration

use crate::error::{LoanError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Runtime settings. `Default` reads environment variables and falls back
/// to built-in values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Training table (CSV)
    pub data_path: PathBuf,
    /// Trained bundle artifact
    pub model_path: PathBuf,
    /// Prediction store connection string
    pub database_url: String,
    /// Rows in a synthesized table
    pub sample_size: usize,
    pub random_seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("API_PORT").unwrap_or(5000),
            data_path: std::env::var("LOAN_DATA_PATH")
                .unwrap_or_else(|_| "loan_data.csv".to_string())
                .into(),
            model_path: std::env::var("LOAN_MODEL_PATH")
                .unwrap_or_else(|_| "loan_model.bin".to_string())
                .into(),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://loan_app.db".to_string()),
            sample_size: env_parse("LOAN_SAMPLE_SIZE").unwrap_or(1000),
            random_seed: env_parse("LOAN_RANDOM_SEED").unwrap_or(42),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl AppConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(LoanError::ConfigError("sample_size must be positive".to_string()));
        }
        if self.data_path.as_os_str().is_empty() {
            return Err(LoanError::ConfigError("data_path must not be empty".to_string()));
        }
        if self.model_path.as_os_str().is_empty() {
            return Err(LoanError::ConfigError("model_path must not be empty".to_string()));
        }
        if self.database_url.trim().is_empty() {
            return Err(LoanError::ConfigError("database_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
