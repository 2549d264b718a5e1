//! RBAC schema migration
//!
//! Creates the tenancy tables the authorization core references and the
//! permission matrix itself:
//! - tenants, branches, users
//! - permissions, roles, role_permissions
//! - user_roles (assignment ledger)
//! - permission_audit_logs

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 1. tenants
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tenants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tenants::Uuid).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Name).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(Tenants::DisplayName).string_len(255).not_null())
                    .col(ColumnDef::new(Tenants::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Tenants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tenants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 2. branches
        manager
            .create_table(
                Table::create()
                    .table(Branches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Branches::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Branches::TenantId).integer().not_null())
                    .col(ColumnDef::new(Branches::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Branches::Code).string_len(50))
                    .col(ColumnDef::new(Branches::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Branches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_branches_tenant_id")
                            .from(Branches::Table, Branches::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 3. users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string_len(255).not_null().unique_key())
                    .col(ColumnDef::new(Users::DisplayName).string_len(255))
                    .col(ColumnDef::new(Users::UserType).string_len(50))
                    .col(ColumnDef::new(Users::TenantId).integer())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::IsSuperuser).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_tenant_id")
                            .from(Users::Table, Users::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 4. permissions
        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Permissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Permissions::Code).string_len(100).not_null().unique_key())
                    .col(ColumnDef::new(Permissions::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Permissions::Description).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Permissions::Category)
                            .string_len(50)
                            .not_null()
                            .default("system"),
                    )
                    .col(ColumnDef::new(Permissions::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Permissions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 5. roles
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roles::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Roles::DisplayName).string_len(100).not_null())
                    .col(ColumnDef::new(Roles::Description).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Roles::LevelRank)
                            .small_integer()
                            .not_null()
                            .check(Expr::col(Roles::LevelRank).between(0, 100)),
                    )
                    .col(ColumnDef::new(Roles::TenantId).integer())
                    .col(ColumnDef::new(Roles::IsSystemRole).boolean().not_null().default(false))
                    .col(ColumnDef::new(Roles::IsActive).boolean().not_null().default(true))
                    .col(
                        ColumnDef::new(Roles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Roles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_roles_tenant_id")
                            .from(Roles::Table, Roles::TenantId)
                            .to(Tenants::Table, Tenants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 6. role_permissions
        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RolePermissions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RolePermissions::RoleId).integer().not_null())
                    .col(ColumnDef::new(RolePermissions::PermissionId).integer().not_null())
                    .col(ColumnDef::new(RolePermissions::AssignedBy).integer())
                    .col(
                        ColumnDef::new(RolePermissions::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_role_id")
                            .from(RolePermissions::Table, RolePermissions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_permission_id")
                            .from(RolePermissions::Table, RolePermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_permissions_assigned_by")
                            .from(RolePermissions::Table, RolePermissions::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 7. user_roles
        manager
            .create_table(
                Table::create()
                    .table(UserRoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRoles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserRoles::UserId).integer().not_null())
                    .col(ColumnDef::new(UserRoles::RoleId).integer().not_null())
                    .col(ColumnDef::new(UserRoles::BranchId).integer())
                    .col(
                        ColumnDef::new(UserRoles::ValidFrom)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(UserRoles::ValidUntil).timestamp_with_time_zone())
                    .col(ColumnDef::new(UserRoles::AssignedBy).integer())
                    .col(
                        ColumnDef::new(UserRoles::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserRoles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(UserRoles::IsActive).boolean().not_null().default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_user_id")
                            .from(UserRoles::Table, UserRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_role_id")
                            .from(UserRoles::Table, UserRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_branch_id")
                            .from(UserRoles::Table, UserRoles::BranchId)
                            .to(Branches::Table, Branches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_assigned_by")
                            .from(UserRoles::Table, UserRoles::AssignedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // 8. permission_audit_logs
        manager
            .create_table(
                Table::create()
                    .table(PermissionAuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PermissionAuditLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PermissionAuditLogs::UserId).integer())
                    .col(ColumnDef::new(PermissionAuditLogs::Action).string_len(20).not_null())
                    .col(ColumnDef::new(PermissionAuditLogs::PermissionCode).string_len(100).not_null())
                    .col(ColumnDef::new(PermissionAuditLogs::ResourceType).string_len(100))
                    .col(ColumnDef::new(PermissionAuditLogs::ResourceId).big_integer())
                    .col(ColumnDef::new(PermissionAuditLogs::Granted).boolean().not_null())
                    .col(ColumnDef::new(PermissionAuditLogs::Reason).text().not_null().default(""))
                    .col(ColumnDef::new(PermissionAuditLogs::IpAddress).string_len(45))
                    .col(ColumnDef::new(PermissionAuditLogs::Path).string_len(500))
                    .col(
                        ColumnDef::new(PermissionAuditLogs::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_permission_audit_logs_user_id")
                            .from(PermissionAuditLogs::Table, PermissionAuditLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse dependency order
        manager
            .drop_table(Table::drop().table(PermissionAuditLogs::Table).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(UserRoles::Table).to_owned()).await?;
        manager
            .drop_table(Table::drop().table(RolePermissions::Table).to_owned())
            .await?;
        manager.drop_table(Table::drop().table(Roles::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Permissions::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Branches::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Tenants::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
pub(super) enum Tenants {
    Table,
    Id,
    Uuid,
    Name,
    DisplayName,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Branches {
    Table,
    Id,
    TenantId,
    Name,
    Code,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Users {
    Table,
    Id,
    Email,
    DisplayName,
    UserType,
    TenantId,
    IsActive,
    IsSuperuser,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Permissions {
    Table,
    Id,
    Code,
    Name,
    Description,
    Category,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Roles {
    Table,
    Id,
    Name,
    DisplayName,
    Description,
    LevelRank,
    TenantId,
    IsSystemRole,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(super) enum RolePermissions {
    Table,
    Id,
    RoleId,
    PermissionId,
    AssignedBy,
    AssignedAt,
}

#[derive(DeriveIden)]
pub(super) enum UserRoles {
    Table,
    Id,
    UserId,
    RoleId,
    BranchId,
    ValidFrom,
    ValidUntil,
    AssignedBy,
    AssignedAt,
    UpdatedAt,
    IsActive,
}

#[derive(DeriveIden)]
pub(super) enum PermissionAuditLogs {
    Table,
    Id,
    UserId,
    Action,
    PermissionCode,
    ResourceType,
    ResourceId,
    Granted,
    Reason,
    IpAddress,
    Path,
    Timestamp,
}
