//! Read-side query helpers for admin and reporting surfaces

use campus_storage::seaorm::entities::{
    permissions, role_permissions, roles, user_roles, Branches, Permissions, Roles, UserRoles, Users,
};
use chrono::Utc;
use sea_orm::{
    sea_query::SimpleExpr, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::{
    error::{RbacError, RbacResult},
    models::{Branch, Permission, Role, RoleAssignment, RoleName, User, UserRole},
    validity,
};

/// Catalogue row as presented in the permission matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSummary {
    pub code: String,
    pub name: String,
    pub description: String,
}

/// A user holding a role through one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleHolder {
    pub assignment: UserRole,
    pub user: User,
}

/// Query helpers over roles, permissions and assignments
#[derive(Clone)]
pub struct RbacSelectors {
    db: DatabaseConnection,
}

impl RbacSelectors {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Active roles visible to a tenant, ordered by authority
    pub async fn tenant_roles(&self, tenant_id: Option<i32>, include_system: bool) -> RbacResult<Vec<Role>> {
        let mut query = Roles::find().filter(roles::Column::IsActive.eq(true));

        if let Some(tenant_id) = tenant_id {
            query = if include_system {
                query.filter(
                    Condition::any()
                        .add(roles::Column::TenantId.eq(tenant_id))
                        .add(roles::Column::TenantId.is_null()),
                )
            } else {
                query.filter(roles::Column::TenantId.eq(tenant_id))
            };
        }

        let rows = query
            .order_by_asc(roles::Column::LevelRank)
            .order_by_asc(roles::Column::Name)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    /// The tenant's role of that name, falling back to a system-wide role
    pub async fn role_by_name(&self, tenant_id: Option<i32>, name: RoleName) -> RbacResult<Option<Role>> {
        if let Some(tenant_id) = tenant_id {
            let own = self.find_role(name, roles::Column::TenantId.eq(tenant_id)).await?;
            if own.is_some() {
                return Ok(own);
            }
        }

        self.find_role(name, roles::Column::TenantId.is_null()).await
    }

    async fn find_role(&self, name: RoleName, scope: SimpleExpr) -> RbacResult<Option<Role>> {
        let role = Roles::find()
            .filter(roles::Column::Name.eq(name))
            .filter(roles::Column::IsActive.eq(true))
            .filter(scope)
            .one(&self.db)
            .await?;

        Ok(role.map(Role::from))
    }

    pub async fn role_by_id(&self, role_id: i32) -> RbacResult<Role> {
        Roles::find_by_id(role_id)
            .one(&self.db)
            .await?
            .map(Role::from)
            .ok_or_else(|| RbacError::role_not_found(role_id.to_string()))
    }

    /// Active permissions granted to a role
    pub async fn role_permissions(&self, role_id: i32) -> RbacResult<Vec<Permission>> {
        let rows = Permissions::find()
            .inner_join(role_permissions::Entity)
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .filter(permissions::Column::IsActive.eq(true))
            .order_by_asc(permissions::Column::Category)
            .order_by_asc(permissions::Column::Code)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    pub async fn all_permissions(&self) -> RbacResult<Vec<Permission>> {
        let rows = Permissions::find()
            .filter(permissions::Column::IsActive.eq(true))
            .order_by_asc(permissions::Column::Category)
            .order_by_asc(permissions::Column::Code)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    pub async fn permissions_by_category(&self, category: &str) -> RbacResult<Vec<Permission>> {
        let rows = Permissions::find()
            .filter(permissions::Column::Category.eq(category))
            .filter(permissions::Column::IsActive.eq(true))
            .order_by_asc(permissions::Column::Code)
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    /// Active permissions grouped by storage category
    pub async fn permission_matrix(&self) -> RbacResult<BTreeMap<String, Vec<PermissionSummary>>> {
        let mut matrix: BTreeMap<String, Vec<PermissionSummary>> = BTreeMap::new();
        for permission in self.all_permissions().await? {
            matrix.entry(permission.category).or_default().push(PermissionSummary {
                code: permission.code,
                name: permission.name,
                description: permission.description,
            });
        }
        Ok(matrix)
    }

    /// A user's assignments with their roles, newest first
    pub async fn user_roles(
        &self,
        user_id: i32,
        branch_id: Option<i32>,
        only_valid: bool,
    ) -> RbacResult<Vec<RoleAssignment>> {
        let mut condition = Condition::all().add(user_roles::Column::UserId.eq(user_id));
        if let Some(branch_id) = branch_id {
            condition = condition.add(validity::applicable_to_branch(branch_id));
        }
        if only_valid {
            condition = condition.add(validity::currently_valid(Utc::now()));
        }

        let rows = UserRoles::find()
            .find_also_related(Roles)
            .filter(condition)
            .order_by_desc(user_roles::Column::AssignedAt)
            .order_by_desc(user_roles::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(assignment, role)| {
                role.map(|role| RoleAssignment {
                    assignment: assignment.into(),
                    role: role.into(),
                })
            })
            .collect())
    }

    /// Holders of a role. A branch filter matches that branch exactly.
    pub async fn users_by_role(
        &self,
        role_id: i32,
        branch_id: Option<i32>,
        only_valid: bool,
    ) -> RbacResult<Vec<RoleHolder>> {
        let mut condition = Condition::all().add(user_roles::Column::RoleId.eq(role_id));
        if let Some(branch_id) = branch_id {
            condition = condition.add(user_roles::Column::BranchId.eq(branch_id));
        }
        if only_valid {
            condition = condition.add(validity::currently_valid(Utc::now()));
        }

        let rows = UserRoles::find()
            .find_also_related(Users)
            .filter(condition)
            .order_by_desc(user_roles::Column::AssignedAt)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(assignment, user)| {
                user.map(|user| RoleHolder {
                    assignment: assignment.into(),
                    user: user.into(),
                })
            })
            .collect())
    }

    /// Number of distinct users per role holding a valid assignment that
    /// applies to the branch, counting tenant-wide assignments in the
    /// branch's tenant
    pub async fn role_summary_for_branch(&self, branch_id: i32) -> RbacResult<BTreeMap<RoleName, u64>> {
        let branch = self.branch(branch_id).await?;

        let rows: Vec<(RoleName, i32)> = UserRoles::find()
            .select_only()
            .column(roles::Column::Name)
            .column(user_roles::Column::UserId)
            .inner_join(Roles)
            .filter(validity::applicable_to_branch(branch.id))
            .filter(validity::currently_valid(Utc::now()))
            .filter(
                Condition::any()
                    .add(roles::Column::TenantId.eq(branch.tenant_id))
                    .add(roles::Column::TenantId.is_null()),
            )
            .into_tuple()
            .all(&self.db)
            .await?;

        let unique: HashSet<(RoleName, i32)> = rows.into_iter().collect();
        let mut summary = BTreeMap::new();
        for (role, _) in unique {
            *summary.entry(role).or_insert(0u64) += 1;
        }
        Ok(summary)
    }

    pub async fn branch(&self, branch_id: i32) -> RbacResult<Branch> {
        Branches::find_by_id(branch_id)
            .one(&self.db)
            .await?
            .map(Branch::from)
            .ok_or(RbacError::BranchNotFound { branch_id })
    }
}
