//! Role entity
//!
//! A role is an authority level inside a tenant. Roles with no tenant apply
//! system-wide. `level_rank` is inverted: a lower number means more authority.

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: RoleName,
    pub display_name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// 0..=100, lower means higher authority
    pub level_rank: i16,
    /// `None` for system-wide roles
    pub tenant_id: Option<i32>,
    /// System roles cannot be deleted
    pub is_system_role: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::TenantId",
        to = "super::tenants::Column::Id"
    )]
    Tenant,
    #[sea_orm(has_many = "super::role_permissions::Entity")]
    RolePermissions,
    #[sea_orm(has_many = "super::user_roles::Entity")]
    UserRoles,
}

impl Related<super::tenants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl Related<super::role_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl Related<super::user_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserRoles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            description: Set(String::new()),
            is_system_role: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..ActiveModelTrait::default()
        }
    }
}

/// Fixed vocabulary of role names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
    #[sea_orm(string_value = "principal")]
    Principal,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "accountant")]
    Accountant,
    #[sea_orm(string_value = "teacher")]
    Teacher,
    #[sea_orm(string_value = "employee")]
    Employee,
    #[sea_orm(string_value = "parent")]
    Parent,
    #[sea_orm(string_value = "student")]
    Student,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Superadmin => "superadmin",
            RoleName::Principal => "principal",
            RoleName::Manager => "manager",
            RoleName::Accountant => "accountant",
            RoleName::Teacher => "teacher",
            RoleName::Employee => "employee",
            RoleName::Parent => "parent",
            RoleName::Student => "student",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            RoleName::Superadmin => "Super Administrator",
            RoleName::Principal => "Principal",
            RoleName::Manager => "Manager",
            RoleName::Accountant => "Accountant",
            RoleName::Teacher => "Teacher",
            RoleName::Employee => "Employee",
            RoleName::Parent => "Parent",
            RoleName::Student => "Student",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "superadmin" => Ok(RoleName::Superadmin),
            "principal" => Ok(RoleName::Principal),
            "manager" => Ok(RoleName::Manager),
            "accountant" => Ok(RoleName::Accountant),
            "teacher" => Ok(RoleName::Teacher),
            "employee" => Ok(RoleName::Employee),
            "parent" => Ok(RoleName::Parent),
            "student" => Ok(RoleName::Student),
            other => Err(format!("unknown role name: {}", other)),
        }
    }
}
