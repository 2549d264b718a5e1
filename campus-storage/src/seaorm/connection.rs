use super::config::DatabaseConfig;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection as SeaConnection, DbErr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Database connection wrapper with configuration
#[derive(Clone)]
pub struct DatabaseConnection {
    connection: SeaConnection,
    config: DatabaseConfig,
}

/// Database-related errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    DbError(#[from] DbErr),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DatabaseConnection {
    /// Create a new database connection with configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Connecting to database: {}", config.url);

        Self::ensure_sqlite_file_exists(&config.url)?;

        // Every pooled connection to `sqlite::memory:` opens its own empty database
        let max_connections = if Self::is_in_memory(&config.url) {
            1
        } else {
            config.max_connections
        };

        let mut opts = ConnectOptions::new(&config.url);
        opts.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(config.connection_timeout)
            .acquire_timeout(config.connection_timeout)
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(true)
            .sqlx_logging_level(log::LevelFilter::Debug);

        let connection = Database::connect(opts).await?;

        debug!("Database connection established with {} max connections", max_connections);

        Ok(Self { connection, config })
    }

    /// Wrap an already established SeaORM connection
    pub fn from_connection(connection: SeaConnection, config: DatabaseConfig) -> Self {
        Self { connection, config }
    }

    fn is_in_memory(database_url: &str) -> bool {
        database_url.starts_with("sqlite:") && database_url.contains(":memory:")
    }

    /// Ensure the parent directory of a file-based SQLite database exists
    fn ensure_sqlite_file_exists(database_url: &str) -> Result<(), DatabaseError> {
        if !database_url.starts_with("sqlite:") {
            debug!("Non-SQLite database detected, skipping file creation logic");
            return Ok(());
        }
        if Self::is_in_memory(database_url) {
            debug!("Using in-memory SQLite database");
            return Ok(());
        }

        let without_scheme = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .ok_or_else(|| DatabaseError::ConfigError(format!("Invalid SQLite URL format: {}", database_url)))?;

        // Drop connection parameters such as `?mode=rwc`
        let file_path = without_scheme.split('?').next().unwrap_or(without_scheme);
        if file_path.is_empty() {
            return Err(DatabaseError::ConfigError(format!(
                "Invalid SQLite URL format: {}",
                database_url
            )));
        }

        let path = Path::new(file_path);
        if let Some(parent_dir) = path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                info!("Creating database directory: {:?}", parent_dir);
                std::fs::create_dir_all(parent_dir).map_err(|e| {
                    DatabaseError::ConfigError(format!(
                        "Failed to create database directory {:?}: {}",
                        parent_dir, e
                    ))
                })?;
            }
        }

        if path.exists() {
            debug!("Using existing database file: {:?}", path);
        } else {
            info!("Database file will be created by SQLite: {:?}", path);
        }

        Ok(())
    }

    /// Get the underlying Sea-ORM connection
    pub fn get_connection(&self) -> &SeaConnection {
        &self.connection
    }

    /// Get database configuration
    pub fn get_config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        use sea_orm_migration::MigratorTrait;

        info!("Running database migrations");

        super::migrations::Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Check database connectivity
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        debug!("Pinging database");

        match self.connection.ping().await {
            Ok(_) => {
                debug!("Database ping successful");
                Ok(())
            }
            Err(e) => {
                debug!("Database ping failed: {}", e);
                Err(DatabaseError::DbError(e))
            }
        }
    }

    /// Execute raw SQL, used by maintenance tooling
    pub async fn execute_raw(&self, sql: &str) -> Result<u64, DatabaseError> {
        let result = self.connection.execute_unprepared(sql).await?;
        Ok(result.rows_affected())
    }

    /// Close the database connection
    pub async fn close(self) -> Result<(), DatabaseError> {
        info!("Closing database connection");
        self.connection.close().await?;
        debug!("Database connection closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 5,
            connection_timeout: Duration::from_secs(10),
        }
    }

    #[tokio::test]
    async fn test_database_connection() {
        let db = DatabaseConnection::new(memory_config()).await.unwrap();
        assert!(db.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_database_migration_is_repeatable() {
        let db = DatabaseConnection::new(memory_config()).await.unwrap();

        db.migrate().await.unwrap();
        // Second run finds every migration already applied
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_database_directory_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("subdir").join("campus.db");

        assert!(!db_path.parent().unwrap().exists());

        let config = DatabaseConfig::sqlite_file(&db_path);
        let db = DatabaseConnection::new(config).await.unwrap();
        db.migrate().await.unwrap();

        assert!(db_path.parent().unwrap().exists());
        assert!(db_path.exists());
    }

    #[test]
    fn test_ensure_sqlite_file_exists_in_memory() {
        assert!(DatabaseConnection::ensure_sqlite_file_exists("sqlite::memory:").is_ok());
    }

    #[test]
    fn test_ensure_sqlite_file_exists_strips_parameters() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("campus.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        DatabaseConnection::ensure_sqlite_file_exists(&db_url).unwrap();

        assert!(db_path.parent().unwrap().exists());
    }

    #[test]
    fn test_ensure_sqlite_file_exists_non_sqlite() {
        assert!(DatabaseConnection::ensure_sqlite_file_exists("postgresql://localhost/campus").is_ok());
    }

    #[test]
    fn test_ensure_sqlite_file_exists_rejects_empty_path() {
        let result = DatabaseConnection::ensure_sqlite_file_exists("sqlite://");
        assert!(matches!(result, Err(DatabaseError::ConfigError(_))));
    }
}
