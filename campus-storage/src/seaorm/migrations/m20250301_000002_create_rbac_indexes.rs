use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

use super::m20250301_000001_create_rbac_tables::{Branches, PermissionAuditLogs, RolePermissions, Roles, UserRoles};

#[derive(DeriveMigrationName)]
pub struct Migration;

/// One live assignment per (user, role, branch); deactivated history rows are exempt.
/// NULL branches are folded to 0 so tenant-wide assignments collide as well.
const USER_ROLES_ACTIVE_KEY: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_user_roles_active_key \
     ON user_roles (user_id, role_id, COALESCE(branch_id, 0)) WHERE is_active";

/// One role per name per tenant, system-wide roles included
const ROLES_NAME_TENANT: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_roles_name_tenant \
     ON roles (name, COALESCE(tenant_id, 0))";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_branches_tenant_name")
                    .table(Branches::Table)
                    .col(Branches::TenantId)
                    .col(Branches::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Role lookups by tenant ordered by authority
        manager
            .create_index(
                Index::create()
                    .name("idx_roles_tenant_rank")
                    .table(Roles::Table)
                    .col(Roles::TenantId)
                    .col(Roles::LevelRank)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_roles_name")
                    .table(Roles::Table)
                    .col(Roles::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_permissions_unique")
                    .table(RolePermissions::Table)
                    .col(RolePermissions::RoleId)
                    .col(RolePermissions::PermissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_user_active")
                    .table(UserRoles::Table)
                    .col(UserRoles::UserId)
                    .col(UserRoles::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_role_branch")
                    .table(UserRoles::Table)
                    .col(UserRoles::RoleId)
                    .col(UserRoles::BranchId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_validity")
                    .table(UserRoles::Table)
                    .col(UserRoles::ValidFrom)
                    .col(UserRoles::ValidUntil)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_user_timestamp")
                    .table(PermissionAuditLogs::Table)
                    .col(PermissionAuditLogs::UserId)
                    .col(PermissionAuditLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_code_granted")
                    .table(PermissionAuditLogs::Table)
                    .col(PermissionAuditLogs::PermissionCode)
                    .col(PermissionAuditLogs::Granted)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_timestamp")
                    .table(PermissionAuditLogs::Table)
                    .col(PermissionAuditLogs::Timestamp)
                    .to_owned(),
            )
            .await?;

        // Expression and partial indexes are not expressible through the builder
        let db = manager.get_connection();
        db.execute_unprepared(USER_ROLES_ACTIVE_KEY).await?;
        db.execute_unprepared(ROLES_NAME_TENANT).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for name in [
            "idx_user_roles_active_key",
            "idx_roles_name_tenant",
            "idx_audit_timestamp",
            "idx_audit_code_granted",
            "idx_audit_user_timestamp",
            "idx_user_roles_validity",
            "idx_user_roles_role_branch",
            "idx_user_roles_user_active",
            "idx_role_permissions_unique",
            "idx_roles_name",
            "idx_roles_tenant_rank",
            "idx_branches_tenant_name",
        ] {
            db.execute_unprepared(&format!("DROP INDEX IF EXISTS {}", name)).await?;
        }
        Ok(())
    }
}
