//! Append-only record of permission checks and role changes

use sea_orm::entity::prelude::*;
use sea_orm::Set;
use sea_query::StringLen;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "permission_audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// `None` for anonymous requests
    pub user_id: Option<i32>,
    pub action: AuditAction,
    pub permission_code: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<i64>,
    pub granted: bool,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub ip_address: Option<String>,
    pub path: Option<String>,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            reason: Set(String::new()),
            timestamp: Set(chrono::Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

/// Kind of audited event
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "grant")]
    Grant,
    #[sea_orm(string_value = "revoke")]
    Revoke,
    #[sea_orm(string_value = "deny")]
    Deny,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Check => "check",
            AuditAction::Grant => "grant",
            AuditAction::Revoke => "revoke",
            AuditAction::Deny => "deny",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
