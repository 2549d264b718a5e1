pub mod branches;
pub mod permission_audit_logs;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod tenants;
pub mod user_roles;
pub mod users;

pub use branches::{ActiveModel as BranchActiveModel, Column as BranchColumn, Entity as Branches, Model as Branch};
pub use permission_audit_logs::{
    ActiveModel as AuditLogActiveModel, AuditAction, Column as AuditLogColumn, Entity as PermissionAuditLogs,
    Model as PermissionAuditLog,
};
pub use permissions::{
    ActiveModel as PermissionActiveModel, Column as PermissionColumn, Entity as Permissions, Model as Permission,
};
pub use role_permissions::{
    ActiveModel as RolePermissionActiveModel, Column as RolePermissionColumn, Entity as RolePermissions,
    Model as RolePermission,
};
pub use roles::{ActiveModel as RoleActiveModel, Column as RoleColumn, Entity as Roles, Model as Role, RoleName};
pub use tenants::{ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenants, Model as Tenant};
pub use user_roles::{
    ActiveModel as UserRoleActiveModel, Column as UserRoleColumn, Entity as UserRoles, Model as UserRole,
};
pub use users::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users, Model as User};
