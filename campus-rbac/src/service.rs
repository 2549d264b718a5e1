//! Authorization decision point
//!
//! [`RbacService`] resolves a user's currently valid roles, answers
//! permission checks, and maintains the assignment ledger. Every check and
//! every grant or revoke produces one audit entry through the configured
//! [`AuditSink`]; audit failures never change a result.

use campus_storage::seaorm::entities::{
    permissions, role_permissions, roles, user_roles, Branches, Permissions, RolePermissions, Roles, UserRoles,
    Users,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    audit::{self, record_quietly, AuditSink, DatabaseAuditSink, NoopAuditSink},
    config::RbacConfig,
    error::{RbacError, RbacResult},
    models::{
        AuditAction, AuditEntry, Permission, Principal, RequestContext, Role, RoleAssignment, RoleName,
        RolePermission, User, UserRole,
    },
    permissions as registry,
    selectors::RbacSelectors,
    validity,
};

const REASON_UNAUTHENTICATED: &str = "User not authenticated";
const REASON_SUPERUSER: &str = "Superuser access";
const REASON_NO_ROLES: &str = "No valid roles found";
const REASON_GRANTED: &str = "Granted through a valid role";
const REASON_NOT_GRANTED: &str = "No valid role grants this permission";

/// RBAC service
#[derive(Clone)]
pub struct RbacService {
    db: DatabaseConnection,
    selectors: RbacSelectors,
    audit: Arc<dyn AuditSink>,
    config: Arc<RbacConfig>,
}

impl RbacService {
    /// Create a service writing its audit trail to the same database
    pub fn new(db: DatabaseConnection, config: RbacConfig) -> Self {
        let audit: Arc<dyn AuditSink> = if config.enable_audit_logging {
            Arc::new(DatabaseAuditSink::new(db.clone()))
        } else {
            Arc::new(NoopAuditSink)
        };

        Self {
            selectors: RbacSelectors::new(db.clone()),
            db,
            audit,
            config: Arc::new(config),
        }
    }

    /// Replace the audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn selectors(&self) -> &RbacSelectors {
        &self.selectors
    }

    pub fn config(&self) -> &RbacConfig {
        &self.config
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    // Permission checks

    /// Audited permission check carrying optional request details
    pub async fn check_permission(
        &self,
        principal: &Principal,
        permission_code: &str,
        branch_id: Option<i32>,
        ctx: Option<&RequestContext>,
    ) -> RbacResult<bool> {
        let (granted, reason) = self.evaluate(principal, permission_code, branch_id).await?;

        debug!(
            user = principal.label(),
            permission = permission_code,
            branch = ?branch_id,
            granted,
            reason,
            "Permission check"
        );

        let entry = AuditEntry::check(principal.user_id(), permission_code, granted, reason).with_context(ctx);
        record_quietly(&self.audit, entry).await;

        Ok(granted)
    }

    pub async fn user_has_permission(
        &self,
        principal: &Principal,
        permission_code: &str,
        branch_id: Option<i32>,
    ) -> RbacResult<bool> {
        self.check_permission(principal, permission_code, branch_id, None).await
    }

    /// True on the first granted code. Each code checked is audited.
    pub async fn user_has_any_permission(
        &self,
        principal: &Principal,
        permission_codes: &[&str],
        branch_id: Option<i32>,
    ) -> RbacResult<bool> {
        for code in permission_codes {
            if self.user_has_permission(principal, code, branch_id).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// False on the first denied code. Each code checked is audited.
    pub async fn user_has_all_permissions(
        &self,
        principal: &Principal,
        permission_codes: &[&str],
        branch_id: Option<i32>,
    ) -> RbacResult<bool> {
        for code in permission_codes {
            if !self.user_has_permission(principal, code, branch_id).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Fails with `Unauthenticated` for anonymous principals and
    /// `AuthorizationDenied` when the check is negative
    pub async fn require_permission(
        &self,
        principal: &Principal,
        permission_code: &str,
        branch_id: Option<i32>,
    ) -> RbacResult<()> {
        let granted = self.user_has_permission(principal, permission_code, branch_id).await?;
        if granted {
            return Ok(());
        }
        if !principal.is_authenticated() {
            return Err(RbacError::Unauthenticated);
        }
        Err(RbacError::denied(principal.label(), permission_code))
    }

    /// Distinct codes reachable through the user's valid roles, sorted
    pub async fn get_user_permissions(&self, principal: &Principal, branch_id: Option<i32>) -> RbacResult<Vec<String>> {
        let Some(user_id) = principal.user_id() else {
            return Ok(Vec::new());
        };

        if self.bypasses_roles(principal) {
            return Ok(registry::all_permissions().into_iter().map(String::from).collect());
        }

        let role_ids = self.valid_role_ids(user_id, branch_id).await?;
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let codes = Permissions::find()
            .select_only()
            .column(permissions::Column::Code)
            .inner_join(RolePermissions)
            .filter(role_permissions::Column::RoleId.is_in(role_ids))
            .filter(permissions::Column::IsActive.eq(true))
            .distinct()
            .order_by_asc(permissions::Column::Code)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(codes)
    }

    async fn evaluate(
        &self,
        principal: &Principal,
        permission_code: &str,
        branch_id: Option<i32>,
    ) -> RbacResult<(bool, &'static str)> {
        let Some(user_id) = principal.user_id() else {
            return Ok((false, REASON_UNAUTHENTICATED));
        };

        if self.bypasses_roles(principal) {
            return Ok((true, REASON_SUPERUSER));
        }

        let role_ids = self.valid_role_ids(user_id, branch_id).await?;
        if role_ids.is_empty() {
            return Ok((false, REASON_NO_ROLES));
        }

        let matches = RolePermissions::find()
            .inner_join(Permissions)
            .filter(role_permissions::Column::RoleId.is_in(role_ids))
            .filter(permissions::Column::Code.eq(permission_code))
            .filter(permissions::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        if matches > 0 {
            Ok((true, REASON_GRANTED))
        } else {
            Ok((false, REASON_NOT_GRANTED))
        }
    }

    fn bypasses_roles(&self, principal: &Principal) -> bool {
        self.config.allow_superuser_bypass && principal.is_superuser()
    }

    // Role resolution

    /// Active roles behind the user's currently valid assignments, most
    /// authoritative first
    pub async fn valid_roles(&self, user_id: i32, branch_id: Option<i32>) -> RbacResult<Vec<Role>> {
        let rows = Roles::find()
            .inner_join(UserRoles)
            .filter(validity::valid_for(user_id, branch_id, Utc::now()))
            .filter(roles::Column::IsActive.eq(true))
            .distinct()
            .order_by_asc(roles::Column::LevelRank)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn valid_role_ids(&self, user_id: i32, branch_id: Option<i32>) -> RbacResult<Vec<i32>> {
        let ids = UserRoles::find()
            .select_only()
            .column(user_roles::Column::RoleId)
            .inner_join(Roles)
            .filter(validity::valid_for(user_id, branch_id, Utc::now()))
            .filter(roles::Column::IsActive.eq(true))
            .distinct()
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;

        Ok(ids)
    }

    pub async fn get_user_roles(
        &self,
        user_id: i32,
        branch_id: Option<i32>,
        only_valid: bool,
    ) -> RbacResult<Vec<RoleAssignment>> {
        self.selectors.user_roles(user_id, branch_id, only_valid).await
    }

    /// Whether `manager` may assign or revoke `target`, judged by the
    /// manager's most authoritative valid role
    pub async fn can_manage_role(&self, manager: &Principal, target: &Role) -> RbacResult<bool> {
        let Some(manager_id) = manager.user_id() else {
            return Ok(false);
        };

        if self.bypasses_roles(manager) {
            return Ok(true);
        }

        let highest = self
            .valid_roles(manager_id, None)
            .await?
            .into_iter()
            .reduce(|best, role| if role.outranks(&best) { role } else { best });

        Ok(highest.is_some_and(|role| role.can_manage(target)))
    }

    async fn ensure_can_manage(&self, actor: Option<&Principal>, target: &Role, verb: &str) -> RbacResult<()> {
        let Some(actor) = actor else {
            return Ok(());
        };
        if !actor.is_authenticated() {
            return Err(RbacError::Unauthenticated);
        }
        if !self.can_manage_role(actor, target).await? {
            return Err(RbacError::denied(actor.label(), format!("{} role {}", verb, target.name)));
        }
        Ok(())
    }

    // Assignment ledger

    /// Grant `role` to a user. Any live assignment for the same
    /// (user, role, branch) is deactivated in the same transaction as the
    /// insert. `assigned_by = None` is a system assignment and skips the
    /// hierarchy check.
    pub async fn assign_role(
        &self,
        user_id: i32,
        role: &Role,
        branch_id: Option<i32>,
        assigned_by: Option<&Principal>,
        valid_until: Option<DateTime<Utc>>,
    ) -> RbacResult<UserRole> {
        self.ensure_can_manage(assigned_by, role, "assign").await?;

        if Users::find_by_id(user_id).one(&self.db).await?.is_none() {
            return Err(RbacError::UserNotFound { user_id });
        }
        if let Some(branch_id) = branch_id {
            let branch = Branches::find_by_id(branch_id)
                .one(&self.db)
                .await?
                .ok_or(RbacError::BranchNotFound { branch_id })?;
            if role.tenant_id.is_some_and(|tenant_id| tenant_id != branch.tenant_id) {
                return Err(RbacError::invalid_role(format!(
                    "role {} belongs to another tenant than branch {}",
                    role.name, branch_id
                )));
            }
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let same_key = match branch_id {
            Some(branch_id) => user_roles::Column::BranchId.eq(branch_id),
            None => user_roles::Column::BranchId.is_null(),
        };
        let replaced = UserRoles::update_many()
            .col_expr(user_roles::Column::IsActive, Expr::value(false))
            .col_expr(user_roles::Column::UpdatedAt, Expr::value(now))
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::RoleId.eq(role.id))
            .filter(same_key)
            .filter(user_roles::Column::IsActive.eq(true))
            .exec(&txn)
            .await?;

        let inserted = user_roles::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role.id),
            branch_id: Set(branch_id),
            valid_until: Set(valid_until),
            assigned_by: Set(assigned_by.and_then(Principal::user_id)),
            ..ActiveModelBehavior::new()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(
            user_id,
            role = %role.name,
            branch = ?branch_id,
            replaced = replaced.rows_affected,
            "Role assigned"
        );

        let entry = AuditEntry::role_change(AuditAction::Grant, user_id, &role.name, assigned_by.map(Principal::label));
        record_quietly(&self.audit, entry).await;

        Ok(inserted.into())
    }

    /// Resolve the role by name in the tenant and assign it
    pub async fn assign_role_by_name(
        &self,
        user_id: i32,
        tenant_id: Option<i32>,
        role_name: RoleName,
        branch_id: Option<i32>,
        assigned_by: Option<&Principal>,
        valid_until: Option<DateTime<Utc>>,
    ) -> RbacResult<UserRole> {
        let role = self
            .selectors
            .role_by_name(tenant_id, role_name)
            .await?
            .ok_or_else(|| RbacError::role_not_found(role_name.as_str()))?;

        self.assign_role(user_id, &role, branch_id, assigned_by, valid_until).await
    }

    /// Provisioning hook for new accounts: assign the role named by the
    /// user's type within the user's tenant. Skipped when no such role
    /// has been seeded.
    pub async fn assign_default_role(&self, user: &User) -> RbacResult<Option<UserRole>> {
        let Some(role_name) = user.user_type else {
            return Ok(None);
        };

        match self.selectors.role_by_name(user.tenant_id, role_name).await? {
            Some(role) => self.assign_role(user.id, &role, None, None, None).await.map(Some),
            None => {
                info!(user_id = user.id, role = %role_name, "No seeded role for user type, skipping default assignment");
                Ok(None)
            }
        }
    }

    /// Soft-revoke an assignment
    pub async fn revoke_role(&self, user_role: &UserRole, revoked_by: Option<&Principal>) -> RbacResult<UserRole> {
        self.revoke_assignment(user_role.id, revoked_by).await
    }

    pub async fn revoke_assignment(&self, assignment_id: i32, revoked_by: Option<&Principal>) -> RbacResult<UserRole> {
        let current = UserRoles::find_by_id(assignment_id)
            .one(&self.db)
            .await?
            .ok_or(RbacError::AssignmentNotFound { assignment_id })?;
        let role = self.selectors.role_by_id(current.role_id).await?;

        self.ensure_can_manage(revoked_by, &role, "revoke").await?;

        let user_id = current.user_id;
        let mut model: user_roles::ActiveModel = current.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&self.db).await?;

        info!(user_id, role = %role.name, assignment_id, "Role revoked");

        let entry = AuditEntry::role_change(AuditAction::Revoke, user_id, &role.name, revoked_by.map(Principal::label));
        record_quietly(&self.audit, entry).await;

        Ok(updated.into())
    }

    // Role permissions

    /// Link a permission to a role. Granting an existing link is a no-op.
    pub async fn grant_permission(
        &self,
        role_id: i32,
        permission_code: &str,
        granted_by: Option<i32>,
    ) -> RbacResult<RolePermission> {
        let permission = self.permission_by_code(permission_code).await?;

        let existing = RolePermissions::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::PermissionId.eq(permission.id))
            .one(&self.db)
            .await?;
        if let Some(existing) = existing {
            return Ok(existing.into());
        }

        let link = role_permissions::ActiveModel {
            role_id: Set(role_id),
            permission_id: Set(permission.id),
            assigned_by: Set(granted_by),
            ..ActiveModelBehavior::new()
        }
        .insert(&self.db)
        .await?;

        info!(role_id, permission = permission_code, "Permission granted to role");
        Ok(link.into())
    }

    /// Remove a permission from a role. Returns whether a link existed.
    pub async fn revoke_permission(&self, role_id: i32, permission_code: &str) -> RbacResult<bool> {
        let permission = self.permission_by_code(permission_code).await?;

        let result = RolePermissions::delete_many()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(role_permissions::Column::PermissionId.eq(permission.id))
            .exec(&self.db)
            .await?;

        info!(role_id, permission = permission_code, removed = result.rows_affected, "Permission revoked from role");
        Ok(result.rows_affected > 0)
    }

    /// Soft-(de)activate a catalogue entry. Inactive permissions never
    /// satisfy a check even while role links remain.
    pub async fn set_permission_active(&self, permission_code: &str, is_active: bool) -> RbacResult<Permission> {
        let mut model: permissions::ActiveModel = Permissions::find()
            .filter(permissions::Column::Code.eq(permission_code))
            .one(&self.db)
            .await?
            .ok_or_else(|| RbacError::PermissionNotFound {
                code: permission_code.to_string(),
            })?
            .into();
        model.is_active = Set(is_active);
        let updated = model.update(&self.db).await?;

        info!(permission = permission_code, is_active, "Permission activity changed");
        Ok(updated.into())
    }

    async fn permission_by_code(&self, code: &str) -> RbacResult<permissions::Model> {
        Permissions::find()
            .filter(permissions::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .ok_or_else(|| RbacError::PermissionNotFound { code: code.to_string() })
    }

    // Principals and audit

    /// Principal for a stored user. Inactive accounts are not authenticated.
    pub async fn load_principal(&self, user_id: i32) -> RbacResult<Principal> {
        let user = Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(RbacError::UserNotFound { user_id })?;

        if !user.is_active {
            return Err(RbacError::Unauthenticated);
        }
        Ok(Principal::from(user))
    }

    pub async fn recent_audit_entries(&self, user_id: Option<i32>, limit: u64) -> RbacResult<Vec<AuditEntry>> {
        audit::recent_entries(&self.db, user_id, limit).await
    }
}
