//! Storage layer for Campus RBAC
//!
//! This crate owns the relational schema behind the authorization core:
//! SeaORM entities for tenants, branches, users, roles, permissions, role
//! assignments and the permission audit trail, the migrations that create
//! them, and a thin connection wrapper.

#[cfg(feature = "seaorm")]
pub mod seaorm;

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(feature = "seaorm")]
pub use seaorm::{DatabaseConfig, DatabaseConnection, DatabaseError};
