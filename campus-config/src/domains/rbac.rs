//! Authorization settings

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Runtime switches for the authorization service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacSettings {
    /// Superusers pass every check without consulting roles
    #[serde(default = "crate::domains::utils::default_true")]
    pub allow_superuser_bypass: bool,

    /// Write permission checks and role changes to the audit log
    #[serde(default = "crate::domains::utils::default_true")]
    pub enable_audit_logging: bool,

    /// Number of audit entries shown by listing commands
    #[serde(default = "default_audit_page_size")]
    pub audit_page_size: u64,
}

impl Default for RbacSettings {
    fn default() -> Self {
        Self {
            allow_superuser_bypass: true,
            enable_audit_logging: true,
            audit_page_size: default_audit_page_size(),
        }
    }
}

impl Validatable for RbacSettings {
    fn validate(&self) -> ConfigResult<()> {
        if !(1..=1000).contains(&self.audit_page_size) {
            return Err(self.validation_error(format!(
                "audit_page_size must be between 1 and 1000, got {}",
                self.audit_page_size
            )));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "rbac"
    }
}

fn default_audit_page_size() -> u64 {
    50
}
