//! Configuration loading and environment variable handling

use crate::domains::{database::DatabaseConfig, logging::LoggingConfig, rbac::RbacSettings, CampusConfig};
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "CAMPUS".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Load configuration from a YAML (or `.json`) file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<CampusConfig> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config: CampusConfig = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        log::debug!("Loaded configuration from {}", path.display());

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<CampusConfig> {
        let mut config = CampusConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<CampusConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut CampusConfig) -> ConfigResult<()> {
        self.apply_database_overrides(&mut config.database)?;
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_rbac_overrides(&mut config.rbac)?;
        Ok(())
    }

    fn apply_database_overrides(&self, config: &mut DatabaseConfig) -> ConfigResult<()> {
        if let Some(url) = self.get_env_var("DATABASE_URL") {
            config.url = url;
        }

        if let Some(max) = self.get_env_var("DATABASE_MAX_CONNECTIONS") {
            config.max_connections = self.parse("DATABASE_MAX_CONNECTIONS", &max)?;
        }

        Ok(())
    }

    fn apply_logging_overrides(&self, config: &mut LoggingConfig) -> ConfigResult<()> {
        if let Some(level) = self.get_env_var("LOG_LEVEL") {
            config.level = self.parse("LOG_LEVEL", &level)?;
        }

        if let Some(format) = self.get_env_var("LOG_FORMAT") {
            config.format = self.parse("LOG_FORMAT", &format)?;
        }

        Ok(())
    }

    fn apply_rbac_overrides(&self, config: &mut RbacSettings) -> ConfigResult<()> {
        if let Some(bypass) = self.get_env_var("RBAC_SUPERUSER_BYPASS") {
            config.allow_superuser_bypass = self.parse("RBAC_SUPERUSER_BYPASS", &bypass)?;
        }

        if let Some(audit) = self.get_env_var("RBAC_AUDIT") {
            config.enable_audit_logging = self.parse("RBAC_AUDIT", &audit)?;
        }

        Ok(())
    }

    fn parse<T>(&self, name: &str, value: &str) -> ConfigResult<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .trim()
            .parse()
            .map_err(|e| ConfigError::EnvError(format!("Invalid {}_{}: {}", self.prefix, name, e)))
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Option<String> {
        let value = std::env::var(format!("{}_{}", self.prefix, name)).ok()?;
        log::debug!("Applying {}_{} override", self.prefix, name);
        Some(value)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
