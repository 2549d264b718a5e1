//! SeaORM implementation for the Campus storage layer
//!
//! This module provides entities, migrations and connection management.

pub mod config;
pub mod connection;
pub mod entities;
pub mod migrations;

pub use config::DatabaseConfig;
pub use connection::{DatabaseConnection, DatabaseError};
pub use entities::*;

// Re-export common SeaORM types for convenience
pub use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection as SeaOrmConnection, DatabaseTransaction, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
pub use sea_orm_migration::{MigrationTrait, MigratorTrait, SchemaManager};
