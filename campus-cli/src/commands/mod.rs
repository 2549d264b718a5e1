//! Command handlers for the `campus` binary

pub mod access;
pub mod config;
pub mod directory;

use anyhow::{Context, Result};
use campus_config::CampusConfig;
use campus_rbac::{RbacConfig, RbacSeeder, RbacService, TenantManager};
use campus_storage::{DatabaseConfig as StorageConfig, DatabaseConnection};
use tracing::{debug, info};

/// Services shared by every database-backed command
pub struct AppContext {
    pub database: DatabaseConnection,
    pub service: RbacService,
    pub manager: TenantManager,
    pub seeder: RbacSeeder,
    pub audit_page_size: u64,
}

impl AppContext {
    /// Connect, migrate when configured to, and build the RBAC services
    pub async fn connect(config: &CampusConfig) -> Result<Self> {
        let storage_config = StorageConfig {
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            connection_timeout: config.database.connection_timeout,
        };

        let database = DatabaseConnection::new(storage_config)
            .await
            .with_context(|| format!("Failed to connect to {}", config.database.url))?;

        if config.database.auto_migrate {
            database.migrate().await.context("Failed to run migrations")?;
            debug!("Database schema is up to date");
        }

        Ok(Self::from_connection(database, config))
    }

    pub fn from_connection(database: DatabaseConnection, config: &CampusConfig) -> Self {
        let rbac_config = rbac_config(config);
        let db = database.get_connection().clone();

        let service = RbacService::new(db.clone(), rbac_config.clone());
        let manager = TenantManager::new(service.clone());
        let seeder = RbacSeeder::new(db, rbac_config);
        info!("RBAC services ready");

        Self {
            database,
            service,
            manager,
            seeder,
            audit_page_size: config.rbac.audit_page_size,
        }
    }
}

/// Authorization flags from the file, over the built-in role matrix
pub fn rbac_config(config: &CampusConfig) -> RbacConfig {
    RbacConfig {
        allow_superuser_bypass: config.rbac.allow_superuser_bypass,
        enable_audit_logging: config.rbac.enable_audit_logging,
        ..RbacConfig::default()
    }
}
