//! Domain-specific configuration modules

pub mod database;
pub mod logging;
pub mod rbac;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main Campus configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CampusConfig {
    /// Database connection configuration
    pub database: database::DatabaseConfig,

    /// Logging configuration
    pub logging: logging::LoggingConfig,

    /// Authorization behaviour
    pub rbac: rbac::RbacSettings,
}

impl CampusConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.logging.validate()?;
        self.rbac.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        serde_yaml::to_string(&CampusConfig::default())
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
