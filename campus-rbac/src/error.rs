//! Error types for RBAC operations

use thiserror::Error;

/// Result type for RBAC operations
pub type RbacResult<T> = Result<T, RbacError>;

/// RBAC-specific errors
#[derive(Error, Debug)]
pub enum RbacError {
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// No authenticated principal was supplied
    #[error("Authentication required")]
    Unauthenticated,

    /// The acting user lacks the permission or the authority over a role
    #[error("User {user} does not have permission: {permission}")]
    AuthorizationDenied { user: String, permission: String },

    /// User not found
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i32 },

    /// Role not found
    #[error("Role not found: {role}")]
    RoleNotFound { role: String },

    /// Role assignment not found
    #[error("Role assignment not found: {assignment_id}")]
    AssignmentNotFound { assignment_id: i32 },

    /// Permission code not present in storage
    #[error("Permission not found: {code}")]
    PermissionNotFound { code: String },

    /// Tenant not found
    #[error("Tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: String },

    /// Branch not found
    #[error("Branch not found: {branch_id}")]
    BranchNotFound { branch_id: i32 },

    /// Role definition or name is not acceptable
    #[error("Invalid role: {message}")]
    InvalidRole { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RbacError {
    /// Create a new authorization denied error
    pub fn denied(user: impl Into<String>, permission: impl Into<String>) -> Self {
        Self::AuthorizationDenied {
            user: user.into(),
            permission: permission.into(),
        }
    }

    /// Create a new role not found error
    pub fn role_not_found(role: impl Into<String>) -> Self {
        Self::RoleNotFound { role: role.into() }
    }

    /// Create a new invalid role error
    pub fn invalid_role(message: impl Into<String>) -> Self {
        Self::InvalidRole {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a permission denied error
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::AuthorizationDenied { .. } | Self::Unauthenticated)
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TenantNotFound { .. }
                | Self::UserNotFound { .. }
                | Self::RoleNotFound { .. }
                | Self::AssignmentNotFound { .. }
                | Self::PermissionNotFound { .. }
                | Self::BranchNotFound { .. }
        )
    }
}
