//! Database testing utilities for campus-storage

use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use std::time::Duration;
use tempfile::TempDir;

use crate::seaorm::{config::DatabaseConfig, connection::DatabaseConnection};

/// Test database for isolated testing
pub struct TestDatabase {
    _temp_dir: TempDir,
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    /// Create a new migrated test database
    pub async fn new() -> Result<Self, TestDatabaseError> {
        Self::new_sqlite().await
    }

    /// Create a new SQLite test database backed by a temporary file
    pub async fn new_sqlite() -> Result<Self, TestDatabaseError> {
        let temp_dir = TempDir::new().map_err(|e| TestDatabaseError::TempDirCreation(e.to_string()))?;

        let config = DatabaseConfig {
            max_connections: 1,
            connection_timeout: Duration::from_secs(5),
            ..DatabaseConfig::sqlite_file(temp_dir.path().join("test.db"))
        };

        let connection = DatabaseConnection::new(config)
            .await
            .map_err(|e| TestDatabaseError::Connection(e.to_string()))?;

        connection
            .migrate()
            .await
            .map_err(|e| TestDatabaseError::Migration(e.to_string()))?;

        Ok(Self {
            _temp_dir: temp_dir,
            connection,
        })
    }

    /// Create an in-memory SQLite database
    pub async fn new_in_memory() -> Result<Self, TestDatabaseError> {
        let temp_dir = TempDir::new().map_err(|e| TestDatabaseError::TempDirCreation(e.to_string()))?;

        let config = DatabaseConfig {
            max_connections: 1,
            ..DatabaseConfig::default()
        };

        let connection = DatabaseConnection::new(config)
            .await
            .map_err(|e| TestDatabaseError::Connection(e.to_string()))?;

        connection
            .migrate()
            .await
            .map_err(|e| TestDatabaseError::Migration(e.to_string()))?;

        Ok(Self {
            _temp_dir: temp_dir,
            connection,
        })
    }

    /// Get a count of records in a table
    pub async fn count_records(&self, table: &str) -> Result<u64, TestDatabaseError> {
        let result = self
            .connection
            .get_connection()
            .query_one(Statement::from_string(
                DatabaseBackend::Sqlite,
                format!("SELECT COUNT(*) AS count FROM {};", table),
            ))
            .await
            .map_err(|e| TestDatabaseError::Query(e.to_string()))?;

        match result {
            Some(row) => {
                let count: i64 = row
                    .try_get("", "count")
                    .map_err(|e| TestDatabaseError::Query(e.to_string()))?;
                Ok(count as u64)
            }
            None => Ok(0),
        }
    }

    /// Drop a table so that writes against it fail
    pub async fn drop_table(&self, table: &str) -> Result<(), TestDatabaseError> {
        self.connection
            .execute_raw(&format!("DROP TABLE {};", table))
            .await
            .map_err(|e| TestDatabaseError::Query(e.to_string()))?;
        Ok(())
    }
}

/// Test database errors
#[derive(Debug, thiserror::Error)]
pub enum TestDatabaseError {
    #[error("Failed to create temporary directory: {0}")]
    TempDirCreation(String),

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),
}
