//! Role-based access control for the Campus school management platform
//!
//! This crate provides multi-tenant, branch-scoped authorization with support for:
//! - A closed permission registry with dot-delimited codes
//! - Ranked roles per tenant plus a system-wide superadmin role
//! - Time-bounded, branch-scoped role assignments with soft revocation
//! - An audit trail of every check and every role change
//! - axum middleware guarding routes by permission code

pub mod audit;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod seed;
pub mod selectors;
pub mod service;
pub mod tenant;
pub mod validity;

pub use audit::{AuditSink, DatabaseAuditSink, NoopAuditSink};
pub use config::{RbacConfig, RoleDefinition};
pub use error::{RbacError, RbacResult};
pub use middleware::{HttpAuthExtractor, PermissionGuard, PrincipalLoader};
pub use models::{
    AuditAction, AuditEntry, Branch, Permission, Principal, RequestContext, Role, RoleAssignment, RoleName, Tenant,
    User, UserRole,
};
pub use permissions::{codes, PermissionCategory};
pub use seed::{RbacSeeder, SeedReport};
pub use selectors::RbacSelectors;
pub use service::RbacService;
pub use tenant::{NewUser, TenantManager};
