//! Shared fixtures for the integration tests

#![allow(dead_code)]

use campus_rbac::{
    models::{Branch, Principal, Role, RoleName, Tenant, User},
    NewUser, RbacConfig, RbacSeeder, RbacService, TenantManager,
};
use campus_storage::{
    seaorm::entities::roles,
    testing::TestDatabase,
};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, DatabaseConnection, Set};

/// A migrated database with one tenant and two branches
pub struct Fixture {
    pub test_db: TestDatabase,
    pub service: RbacService,
    pub manager: TenantManager,
    pub tenant: Tenant,
    pub north: Branch,
    pub south: Branch,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_config(RbacConfig::default()).await
    }

    pub async fn with_config(config: RbacConfig) -> Self {
        let test_db = TestDatabase::new().await.unwrap();
        let db = test_db.connection.get_connection().clone();
        RbacSeeder::new(db.clone(), config.clone()).create_permissions().await.unwrap();
        let service = RbacService::new(db, config);
        let manager = TenantManager::new(service.clone());

        let tenant = manager.create_tenant("greenfield", "Greenfield School").await.unwrap();
        let north = manager.create_branch(tenant.id, "North", Some("N")).await.unwrap();
        let south = manager.create_branch(tenant.id, "South", Some("S")).await.unwrap();

        Self {
            test_db,
            service,
            manager,
            tenant,
            north,
            south,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.test_db.connection.get_connection()
    }

    pub async fn user(&self, email: &str) -> User {
        self.manager
            .create_user(NewUser::new(email).in_tenant(self.tenant.id))
            .await
            .unwrap()
    }

    pub async fn superuser(&self, email: &str) -> User {
        self.manager.create_user(NewUser::new(email).superuser()).await.unwrap()
    }

    /// A tenant role with the given rank, bypassing the seeder
    pub async fn role(&self, name: RoleName, level_rank: i16) -> Role {
        roles::ActiveModel {
            name: Set(name),
            display_name: Set(name.label().to_string()),
            level_rank: Set(level_rank),
            tenant_id: Set(Some(self.tenant.id)),
            ..ActiveModelBehavior::new()
        }
        .insert(self.db())
        .await
        .unwrap()
        .into()
    }

    pub async fn role_with(&self, name: RoleName, level_rank: i16, codes: &[&str]) -> Role {
        let role = self.role(name, level_rank).await;
        for code in codes {
            self.service.grant_permission(role.id, code, None).await.unwrap();
        }
        role
    }
}

pub fn principal(user: &User) -> Principal {
    user.principal()
}
