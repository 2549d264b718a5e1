//! Bootstrap of the permission catalogue and default roles
//!
//! Seeding is idempotent: permissions and roles are upserted, and
//! role-permission links are only ever added unless `force` is set, in
//! which case a tenant's links are rebuilt from the configured matrix.

use campus_storage::seaorm::entities::{
    permissions, role_permissions, roles, Permissions, RolePermissions, Roles, Tenants,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::{
    config::{RbacConfig, RoleDefinition},
    error::{RbacError, RbacResult},
    permissions::{self as registry, PermissionCategory},
};

/// Counters describing what a seeding run changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub permissions_updated: usize,
    pub roles_created: usize,
    pub roles_updated: usize,
    pub links_created: usize,
    pub links_removed: usize,
    pub links_skipped: usize,
    pub tenants_seeded: usize,
}

impl SeedReport {
    pub fn merge(&mut self, other: SeedReport) {
        self.permissions_created += other.permissions_created;
        self.permissions_updated += other.permissions_updated;
        self.roles_created += other.roles_created;
        self.roles_updated += other.roles_updated;
        self.links_created += other.links_created;
        self.links_removed += other.links_removed;
        self.links_skipped += other.links_skipped;
        self.tenants_seeded += other.tenants_seeded;
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "permissions created: {}, updated: {}; roles created: {}, updated: {}; links created: {}, removed: {}, skipped: {}; tenants: {}",
            self.permissions_created,
            self.permissions_updated,
            self.roles_created,
            self.roles_updated,
            self.links_created,
            self.links_removed,
            self.links_skipped,
            self.tenants_seeded
        )
    }
}

/// Seeds permissions, the system role and per-tenant roles
pub struct RbacSeeder {
    db: DatabaseConnection,
    config: RbacConfig,
}

impl RbacSeeder {
    pub fn new(db: DatabaseConnection, config: RbacConfig) -> Self {
        Self { db, config }
    }

    /// Upsert the registry into `permissions`
    pub async fn create_permissions(&self) -> RbacResult<SeedReport> {
        let mut report = SeedReport::default();
        upsert_permissions(&self.db, &mut report).await?;
        Ok(report)
    }

    /// Upsert the system-wide role and grant it its permissions
    pub async fn create_system_roles(&self) -> RbacResult<SeedReport> {
        let mut report = SeedReport::default();
        seed_system_role(&self.db, &self.config.system_role, &mut report).await?;
        Ok(report)
    }

    /// Upsert the tenant roles and link the default matrix
    pub async fn seed_for_tenant(&self, tenant_id: i32, force: bool) -> RbacResult<SeedReport> {
        self.config.validate()?;

        let txn = self.db.begin().await?;
        let mut report = SeedReport::default();
        seed_tenant(&txn, tenant_id, &self.config.tenant_roles, force, &mut report).await?;
        txn.commit().await?;

        Ok(report)
    }

    /// Everything above for every tenant, in one transaction
    pub async fn seed_all(&self, force: bool) -> RbacResult<SeedReport> {
        self.config.validate()?;
        info!(force, "Starting RBAC seeding");

        let txn = self.db.begin().await?;
        let mut report = SeedReport::default();

        upsert_permissions(&txn, &mut report).await?;
        seed_system_role(&txn, &self.config.system_role, &mut report).await?;

        let tenant_ids: Vec<i32> = Tenants::find().all(&txn).await?.into_iter().map(|t| t.id).collect();
        for tenant_id in tenant_ids {
            seed_tenant(&txn, tenant_id, &self.config.tenant_roles, force, &mut report).await?;
        }

        txn.commit().await?;
        info!(%report, "RBAC seeding completed");
        Ok(report)
    }
}

async fn upsert_permissions<C: ConnectionTrait>(conn: &C, report: &mut SeedReport) -> RbacResult<()> {
    for def in registry::definitions() {
        let category = PermissionCategory::for_code(def.code).as_str();
        let existing = Permissions::find()
            .filter(permissions::Column::Code.eq(def.code))
            .one(conn)
            .await?;

        match existing {
            Some(model) => {
                let mut model: permissions::ActiveModel = model.into();
                model.name = Set(def.name());
                model.description = Set(def.description.to_string());
                model.category = Set(category.to_string());
                model.is_active = Set(true);
                model.update(conn).await?;
                report.permissions_updated += 1;
            }
            None => {
                permissions::ActiveModel {
                    code: Set(def.code.to_string()),
                    name: Set(def.name()),
                    description: Set(def.description.to_string()),
                    category: Set(category.to_string()),
                    ..ActiveModelBehavior::new()
                }
                .insert(conn)
                .await?;
                report.permissions_created += 1;
            }
        }
    }

    info!(
        created = report.permissions_created,
        updated = report.permissions_updated,
        "Permissions seeded"
    );
    Ok(())
}

async fn seed_system_role<C: ConnectionTrait>(
    conn: &C,
    def: &RoleDefinition,
    report: &mut SeedReport,
) -> RbacResult<()> {
    let role_id = upsert_role(conn, def, None, true, report).await?;
    link_permissions(conn, role_id, &def.resolved_permissions(), report).await?;
    info!(role = %def.name, "System role seeded");
    Ok(())
}

async fn seed_tenant<C: ConnectionTrait>(
    conn: &C,
    tenant_id: i32,
    definitions: &[RoleDefinition],
    force: bool,
    report: &mut SeedReport,
) -> RbacResult<()> {
    if Tenants::find_by_id(tenant_id).one(conn).await?.is_none() {
        return Err(RbacError::TenantNotFound {
            tenant_id: tenant_id.to_string(),
        });
    }

    let mut role_ids = Vec::with_capacity(definitions.len());
    for def in definitions {
        role_ids.push(upsert_role(conn, def, Some(tenant_id), false, report).await?);
    }

    if force {
        let tenant_role_ids: Vec<i32> = Roles::find()
            .select_only()
            .column(roles::Column::Id)
            .filter(roles::Column::TenantId.eq(tenant_id))
            .into_tuple()
            .all(conn)
            .await?;
        let removed = RolePermissions::delete_many()
            .filter(role_permissions::Column::RoleId.is_in(tenant_role_ids))
            .exec(conn)
            .await?;
        report.links_removed += removed.rows_affected as usize;
    }

    for (def, role_id) in definitions.iter().zip(role_ids) {
        link_permissions(conn, role_id, &def.resolved_permissions(), report).await?;
    }

    report.tenants_seeded += 1;
    info!(tenant_id, force, "Tenant roles seeded");
    Ok(())
}

/// Returns the role id
async fn upsert_role<C: ConnectionTrait>(
    conn: &C,
    def: &RoleDefinition,
    tenant_id: Option<i32>,
    is_system_role: bool,
    report: &mut SeedReport,
) -> RbacResult<i32> {
    let scope = match tenant_id {
        Some(tenant_id) => Condition::all().add(roles::Column::TenantId.eq(tenant_id)),
        None => Condition::all().add(roles::Column::TenantId.is_null()),
    };
    let existing = Roles::find()
        .filter(roles::Column::Name.eq(def.name))
        .filter(scope)
        .one(conn)
        .await?;

    match existing {
        Some(model) => {
            let mut model: roles::ActiveModel = model.into();
            model.display_name = Set(def.display_name.clone());
            model.level_rank = Set(def.level_rank);
            model.description = Set(def.description.clone());
            model.is_system_role = Set(is_system_role);
            model.updated_at = Set(Utc::now());
            let updated = model.update(conn).await?;
            report.roles_updated += 1;
            Ok(updated.id)
        }
        None => {
            let created = roles::ActiveModel {
                name: Set(def.name),
                display_name: Set(def.display_name.clone()),
                level_rank: Set(def.level_rank),
                description: Set(def.description.clone()),
                tenant_id: Set(tenant_id),
                is_system_role: Set(is_system_role),
                ..ActiveModelBehavior::new()
            }
            .insert(conn)
            .await?;
            info!(role = %def.name, tenant_id = ?tenant_id, "Created role");
            report.roles_created += 1;
            Ok(created.id)
        }
    }
}

async fn link_permissions<C: ConnectionTrait>(
    conn: &C,
    role_id: i32,
    codes: &[String],
    report: &mut SeedReport,
) -> RbacResult<()> {
    let available = Permissions::find()
        .filter(permissions::Column::Code.is_in(codes.iter().map(String::as_str)))
        .filter(permissions::Column::IsActive.eq(true))
        .all(conn)
        .await?;

    let linked: HashSet<i32> = RolePermissions::find()
        .select_only()
        .column(role_permissions::Column::PermissionId)
        .filter(role_permissions::Column::RoleId.eq(role_id))
        .into_tuple::<i32>()
        .all(conn)
        .await?
        .into_iter()
        .collect();

    let mut new_links = Vec::new();
    for code in codes {
        match available.iter().find(|p| &p.code == code) {
            Some(permission) if !linked.contains(&permission.id) => {
                new_links.push(role_permissions::ActiveModel {
                    role_id: Set(role_id),
                    permission_id: Set(permission.id),
                    assigned_by: Set(None),
                    ..ActiveModelBehavior::new()
                });
            }
            Some(_) => {}
            None => {
                warn!(permission = %code, role_id, "Permission not found, skipping");
                report.links_skipped += 1;
            }
        }
    }

    if !new_links.is_empty() {
        report.links_created += new_links.len();
        RolePermissions::insert_many(new_links).exec(conn).await?;
    }
    Ok(())
}
