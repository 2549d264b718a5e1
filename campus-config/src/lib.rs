//! Domain-driven configuration management for Campus
//!
//! Configuration is split by functional domain. Each domain has defaults,
//! can be overridden through `CAMPUS_*` environment variables, and is
//! validated through the [`Validatable`] trait.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    database::DatabaseConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    rbac::RbacSettings,
    CampusConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
