//! Database configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_url, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://campus.db?mode=rwc", "sqlite::memory:")
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of database connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout
    #[serde(with = "crate::domains::utils::serde_duration", default = "default_connection_timeout")]
    pub connection_timeout: Duration,

    /// Whether to run migrations before any other command
    #[serde(default = "crate::domains::utils::default_true")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: true,
        }
    }
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:")
    }
}

impl Validatable for DatabaseConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.url, "url", self.domain_name())?;
        validate_positive(self.max_connections, "max_connections", self.domain_name())?;
        validate_positive(self.connection_timeout.as_secs(), "connection_timeout", self.domain_name())?;

        if !self.url.starts_with("sqlite:") && !self.url.starts_with("postgres") {
            return Err(self.validation_error(format!("unsupported database backend in {}", self.url)));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "database"
    }
}

fn default_database_url() -> String {
    "sqlite://campus.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(30)
}
