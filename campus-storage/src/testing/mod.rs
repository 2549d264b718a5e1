//! Testing utilities for campus-storage
//!
//! `TestDatabase` gives each test its own migrated SQLite database that is
//! removed when the value is dropped.
//!
//! ```toml
//! [dev-dependencies]
//! campus-storage = { path = "../campus-storage", features = ["testing"] }
//! ```

pub mod database;

pub use database::{TestDatabase, TestDatabaseError};
