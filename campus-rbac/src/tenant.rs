//! Tenant, branch and user directory
//!
//! Only what the authorization core needs for referential integrity. User
//! creation runs the default-role provisioning hook.

use campus_storage::seaorm::entities::{branches, tenants, users, Branches, Tenants, Users};
use chrono::Utc;
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{RbacError, RbacResult},
    models::{Branch, RoleName, Tenant, User},
    service::RbacService,
};

/// Input for [`TenantManager::create_user`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub display_name: Option<String>,
    pub user_type: Option<RoleName>,
    pub tenant_id: Option<i32>,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    pub fn in_tenant(mut self, tenant_id: i32) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_type(mut self, user_type: RoleName) -> Self {
        self.user_type = Some(user_type);
        self
    }

    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }
}

/// Tenant manager for multi-tenant operations
pub struct TenantManager {
    db: DatabaseConnection,
    rbac: RbacService,
}

impl TenantManager {
    pub fn new(rbac: RbacService) -> Self {
        Self {
            db: rbac.connection().clone(),
            rbac,
        }
    }

    /// Create a new tenant
    pub async fn create_tenant(&self, name: &str, display_name: &str) -> RbacResult<Tenant> {
        let tenant = tenants::ActiveModel {
            name: Set(name.to_string()),
            display_name: Set(display_name.to_string()),
            ..ActiveModelBehavior::new()
        }
        .insert(&self.db)
        .await?;

        info!(tenant_id = tenant.id, name, "Created tenant");
        Ok(tenant.into())
    }

    pub async fn get_tenant(&self, tenant_id: i32) -> RbacResult<Option<Tenant>> {
        Ok(Tenants::find_by_id(tenant_id).one(&self.db).await?.map(Tenant::from))
    }

    pub async fn get_tenant_by_name(&self, name: &str) -> RbacResult<Option<Tenant>> {
        let tenant = Tenants::find()
            .filter(tenants::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(tenant.map(Tenant::from))
    }

    pub async fn list_tenants(&self, only_active: bool) -> RbacResult<Vec<Tenant>> {
        let mut query = Tenants::find();
        if only_active {
            query = query.filter(tenants::Column::IsActive.eq(true));
        }

        let tenants = query.order_by_asc(tenants::Column::Id).all(&self.db).await?;
        Ok(tenants.into_iter().map(Tenant::from).collect())
    }

    /// Soft delete by marking inactive
    pub async fn deactivate_tenant(&self, tenant_id: i32) -> RbacResult<Tenant> {
        let mut tenant: tenants::ActiveModel = Tenants::find_by_id(tenant_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| RbacError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            })?
            .into();
        tenant.is_active = Set(false);
        tenant.updated_at = Set(Utc::now());

        Ok(tenant.update(&self.db).await?.into())
    }

    pub async fn create_branch(&self, tenant_id: i32, name: &str, code: Option<&str>) -> RbacResult<Branch> {
        if self.get_tenant(tenant_id).await?.is_none() {
            return Err(RbacError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            });
        }

        let branch = branches::ActiveModel {
            tenant_id: Set(tenant_id),
            name: Set(name.to_string()),
            code: Set(code.map(String::from)),
            ..ActiveModelBehavior::new()
        }
        .insert(&self.db)
        .await?;

        info!(branch_id = branch.id, tenant_id, name, "Created branch");
        Ok(branch.into())
    }

    pub async fn list_branches(&self, tenant_id: i32) -> RbacResult<Vec<Branch>> {
        let branches = Branches::find()
            .filter(branches::Column::TenantId.eq(tenant_id))
            .order_by_asc(branches::Column::Name)
            .all(&self.db)
            .await?;
        Ok(branches.into_iter().map(Branch::from).collect())
    }

    /// Create a user and assign the default role for its type
    pub async fn create_user(&self, new_user: NewUser) -> RbacResult<User> {
        if let Some(tenant_id) = new_user.tenant_id {
            if self.get_tenant(tenant_id).await?.is_none() {
                return Err(RbacError::TenantNotFound {
                    tenant_id: tenant_id.to_string(),
                });
            }
        }

        let user: User = users::ActiveModel {
            email: Set(new_user.email),
            display_name: Set(new_user.display_name),
            user_type: Set(new_user.user_type),
            tenant_id: Set(new_user.tenant_id),
            is_superuser: Set(new_user.is_superuser),
            ..ActiveModelBehavior::new()
        }
        .insert(&self.db)
        .await?
        .into();

        info!(user_id = user.id, email = %user.email, "Created user");

        self.rbac.assign_default_role(&user).await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i32) -> RbacResult<Option<User>> {
        Ok(Users::find_by_id(user_id).one(&self.db).await?.map(User::from))
    }

    pub async fn get_user_by_email(&self, email: &str) -> RbacResult<Option<User>> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(user.map(User::from))
    }
}
