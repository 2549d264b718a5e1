//! Data models for the RBAC core
//!
//! These are the domain-side views of the storage entities. Services hand
//! them out instead of raw SeaORM models so callers never depend on the
//! persistence layer directly.

use campus_storage::seaorm::entities::{
    branches, permission_audit_logs, permissions, role_permissions, roles, tenants, user_roles, users,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use campus_storage::seaorm::entities::{AuditAction, RoleName};

/// Tenant (school) information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: i32,
    pub uuid: Uuid,
    pub name: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<tenants::Model> for Tenant {
    fn from(model: tenants::Model) -> Self {
        Self {
            id: model.id,
            uuid: model.uuid,
            name: model.name,
            display_name: model.display_name,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Branch of a tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub code: Option<String>,
    pub is_active: bool,
}

impl From<branches::Model> for Branch {
    fn from(model: branches::Model) -> Self {
        Self {
            id: model.id,
            tenant_id: model.tenant_id,
            name: model.name,
            code: model.code,
            is_active: model.is_active,
        }
    }
}

/// User account as seen by the authorization core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub display_name: Option<String>,
    pub user_type: Option<RoleName>,
    pub tenant_id: Option<i32>,
    pub is_active: bool,
    pub is_superuser: bool,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::User {
            id: self.id,
            email: self.email.clone(),
            is_superuser: self.is_superuser,
            tenant_id: self.tenant_id,
        }
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            user_type: model.user_type,
            tenant_id: model.tenant_id,
            is_active: model.is_active,
            is_superuser: model.is_superuser,
        }
    }
}

/// The identity a check is evaluated for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Principal {
    Anonymous,
    User {
        id: i32,
        email: String,
        is_superuser: bool,
        tenant_id: Option<i32>,
    },
}

impl Principal {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::User { .. })
    }

    pub fn user_id(&self) -> Option<i32> {
        match self {
            Principal::User { id, .. } => Some(*id),
            Principal::Anonymous => None,
        }
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Principal::User { is_superuser: true, .. })
    }

    pub fn tenant_id(&self) -> Option<i32> {
        match self {
            Principal::User { tenant_id, .. } => *tenant_id,
            Principal::Anonymous => None,
        }
    }

    /// Identifier used in error messages and audit reasons
    pub fn label(&self) -> &str {
        match self {
            Principal::User { email, .. } => email,
            Principal::Anonymous => "anonymous",
        }
    }
}

impl From<users::Model> for Principal {
    fn from(model: users::Model) -> Self {
        Principal::User {
            id: model.id,
            email: model.email,
            is_superuser: model.is_superuser,
            tenant_id: model.tenant_id,
        }
    }
}

/// Catalogue entry mirrored in storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub is_active: bool,
}

impl From<permissions::Model> for Permission {
    fn from(model: permissions::Model) -> Self {
        Self {
            id: model.id,
            code: model.code,
            name: model.name,
            description: model.description,
            category: model.category,
            is_active: model.is_active,
        }
    }
}

/// Authority level inside a tenant, or system-wide when `tenant_id` is `None`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i32,
    pub name: RoleName,
    pub display_name: String,
    pub description: String,
    pub level_rank: i16,
    pub tenant_id: Option<i32>,
    pub is_system_role: bool,
    pub is_active: bool,
}

impl Role {
    /// Whether this role carries strictly more authority than `other`.
    ///
    /// Ranks are inverted: a lower `level_rank` means more authority. Every
    /// authority comparison in the crate goes through this method.
    pub fn outranks(&self, other: &Role) -> bool {
        self.level_rank < other.level_rank
    }

    /// A holder of this role may assign or revoke `target`
    pub fn can_manage(&self, target: &Role) -> bool {
        self.outranks(target)
    }

    pub fn is_system_wide(&self) -> bool {
        self.tenant_id.is_none()
    }
}

impl From<roles::Model> for Role {
    fn from(model: roles::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            display_name: model.display_name,
            description: model.description,
            level_rank: model.level_rank,
            tenant_id: model.tenant_id,
            is_system_role: model.is_system_role,
            is_active: model.is_active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermission {
    pub id: i32,
    pub role_id: i32,
    pub permission_id: i32,
    pub assigned_by: Option<i32>,
    pub assigned_at: DateTime<Utc>,
}

impl From<role_permissions::Model> for RolePermission {
    fn from(model: role_permissions::Model) -> Self {
        Self {
            id: model.id,
            role_id: model.role_id,
            permission_id: model.permission_id,
            assigned_by: model.assigned_by,
            assigned_at: model.assigned_at,
        }
    }
}

/// One row of the assignment ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub id: i32,
    pub user_id: i32,
    pub role_id: i32,
    /// `None` means tenant-wide
    pub branch_id: Option<i32>,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub assigned_by: Option<i32>,
    pub assigned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

impl UserRole {
    /// Currently active and inside its validity window
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now >= self.valid_from && self.valid_until.map_or(true, |until| now <= until)
    }

    pub fn is_tenant_wide(&self) -> bool {
        self.branch_id.is_none()
    }

    /// Tenant-wide assignments apply to every branch
    pub fn applies_to_branch(&self, branch_id: Option<i32>) -> bool {
        match (self.branch_id, branch_id) {
            (None, _) | (_, None) => true,
            (Some(own), Some(requested)) => own == requested,
        }
    }
}

impl From<user_roles::Model> for UserRole {
    fn from(model: user_roles::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            role_id: model.role_id,
            branch_id: model.branch_id,
            valid_from: model.valid_from,
            valid_until: model.valid_until,
            assigned_by: model.assigned_by,
            assigned_at: model.assigned_at,
            updated_at: model.updated_at,
            is_active: model.is_active,
        }
    }
}

/// An assignment together with the role it grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub assignment: UserRole,
    pub role: Role,
}

/// Request details attached to audited checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub path: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<i64>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_resource(mut self, resource_type: impl Into<String>, resource_id: Option<i64>) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = resource_id;
        self
    }
}

/// Audit trail record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Option<i32>,
    pub action: AuditAction,
    pub permission_code: String,
    pub granted: bool,
    pub reason: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<i64>,
    pub ip_address: Option<String>,
    pub path: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Outcome of a permission check
    pub fn check(user_id: Option<i32>, permission_code: &str, granted: bool, reason: impl Into<String>) -> Self {
        Self {
            user_id,
            action: AuditAction::Check,
            permission_code: permission_code.to_string(),
            granted,
            reason: reason.into(),
            resource_type: None,
            resource_id: None,
            ip_address: None,
            path: None,
            timestamp: Utc::now(),
        }
    }

    /// Grant or revoke of a role. `actor` is `None` for system changes.
    pub fn role_change(action: AuditAction, user_id: i32, role: &RoleName, actor: Option<&str>) -> Self {
        let verb = match action {
            AuditAction::Revoke => "revoked",
            _ => "granted",
        };
        Self {
            user_id: Some(user_id),
            action,
            permission_code: format!("role.{}", action.as_str()),
            granted: true,
            reason: format!("Role {} {} by {}", role, verb, actor.unwrap_or("system")),
            resource_type: None,
            resource_id: None,
            ip_address: None,
            path: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_context(mut self, ctx: Option<&RequestContext>) -> Self {
        if let Some(ctx) = ctx {
            self.ip_address = ctx.ip_address.clone();
            self.path = ctx.path.clone();
            self.resource_type = ctx.resource_type.clone();
            self.resource_id = ctx.resource_id;
        }
        self
    }
}

impl From<permission_audit_logs::Model> for AuditEntry {
    fn from(model: permission_audit_logs::Model) -> Self {
        Self {
            user_id: model.user_id,
            action: model.action,
            permission_code: model.permission_code,
            granted: model.granted,
            reason: model.reason,
            resource_type: model.resource_type,
            resource_id: model.resource_id,
            ip_address: model.ip_address,
            path: model.path,
            timestamp: model.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn role(name: RoleName, rank: i16) -> Role {
        Role {
            id: rank as i32,
            name,
            display_name: name.label().to_string(),
            description: String::new(),
            level_rank: rank,
            tenant_id: Some(1),
            is_system_role: false,
            is_active: true,
        }
    }

    fn assignment(valid_from: DateTime<Utc>, valid_until: Option<DateTime<Utc>>, is_active: bool) -> UserRole {
        UserRole {
            id: 1,
            user_id: 1,
            role_id: 1,
            branch_id: None,
            valid_from,
            valid_until,
            assigned_by: None,
            assigned_at: valid_from,
            updated_at: valid_from,
            is_active,
        }
    }

    #[test]
    fn test_lower_rank_outranks() {
        let manager = role(RoleName::Manager, 2);
        let teacher = role(RoleName::Teacher, 4);

        assert!(manager.outranks(&teacher));
        assert!(!teacher.outranks(&manager));
        assert!(manager.can_manage(&teacher));
        assert!(!teacher.can_manage(&manager));
    }

    #[test]
    fn test_equal_rank_cannot_manage() {
        let a = role(RoleName::Teacher, 4);
        let b = role(RoleName::Employee, 4);
        assert!(!a.can_manage(&b));
        assert!(!b.can_manage(&a));
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();

        let expired = assignment(now - Duration::days(10), Some(now - Duration::days(1)), true);
        assert!(!expired.is_valid_at(now));

        let future_end = assignment(now - Duration::days(1), Some(now + Duration::days(1)), true);
        assert!(future_end.is_valid_at(now));

        let open_ended = assignment(now - Duration::days(1), None, true);
        assert!(open_ended.is_valid_at(now));
        assert!(open_ended.is_valid_at(now + Duration::days(365 * 50)));

        let not_started = assignment(now + Duration::days(1), None, true);
        assert!(!not_started.is_valid_at(now));

        let inactive = assignment(now - Duration::days(1), None, false);
        assert!(!inactive.is_valid_at(now));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc::now();
        let ur = assignment(now, Some(now), true);
        assert!(ur.is_valid_at(now));
    }

    #[test]
    fn test_branch_applicability() {
        let now = Utc::now();
        let mut ur = assignment(now, None, true);
        assert!(ur.applies_to_branch(Some(5)));
        assert!(ur.applies_to_branch(None));

        ur.branch_id = Some(5);
        assert!(ur.applies_to_branch(Some(5)));
        assert!(!ur.applies_to_branch(Some(6)));
    }

    #[test]
    fn test_role_change_reason() {
        let entry = AuditEntry::role_change(AuditAction::Grant, 3, &RoleName::Teacher, Some("boss@school.test"));
        assert_eq!(entry.permission_code, "role.grant");
        assert_eq!(entry.reason, "Role teacher granted by boss@school.test");

        let entry = AuditEntry::role_change(AuditAction::Revoke, 3, &RoleName::Teacher, None);
        assert_eq!(entry.permission_code, "role.revoke");
        assert_eq!(entry.reason, "Role teacher revoked by system");
    }

    #[test]
    fn test_principal_accessors() {
        let anon = Principal::Anonymous;
        assert!(!anon.is_authenticated());
        assert_eq!(anon.user_id(), None);
        assert_eq!(anon.label(), "anonymous");

        let user = Principal::User {
            id: 9,
            email: "root@school.test".into(),
            is_superuser: true,
            tenant_id: None,
        };
        assert!(user.is_authenticated());
        assert!(user.is_superuser());
        assert_eq!(user.user_id(), Some(9));
    }
}
