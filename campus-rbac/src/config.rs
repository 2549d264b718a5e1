//! Configuration for the RBAC core

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    error::{RbacError, RbacResult},
    models::RoleName,
    permissions::{self, codes},
};

/// Grants every registered permission when used in a role's permission list
pub const ALL_PERMISSIONS: &str = "*";

/// RBAC configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    /// Superusers skip the role graph entirely when set
    pub allow_superuser_bypass: bool,

    /// Enable audit logging for authorization decisions
    pub enable_audit_logging: bool,

    /// System-wide role seeded outside any tenant
    pub system_role: RoleDefinition,

    /// Roles seeded for every tenant
    pub tenant_roles: Vec<RoleDefinition>,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            allow_superuser_bypass: true,
            enable_audit_logging: true,
            system_role: RoleDefinition::new(
                RoleName::Superadmin,
                "Super Administrator",
                0,
                "System-wide administrator with all permissions",
                vec![ALL_PERMISSIONS],
            ),
            tenant_roles: default_tenant_roles(),
        }
    }
}

impl RbacConfig {
    /// Get a tenant role definition by name
    pub fn tenant_role(&self, name: RoleName) -> Option<&RoleDefinition> {
        self.tenant_roles.iter().find(|r| r.name == name)
    }

    /// Check rank bounds, duplicate names and unknown permission codes
    pub fn validate(&self) -> RbacResult<()> {
        let mut seen = HashSet::new();
        for def in std::iter::once(&self.system_role).chain(self.tenant_roles.iter()) {
            if !(0..=100).contains(&def.level_rank) {
                return Err(RbacError::invalid_role(format!(
                    "{} has level_rank {} outside 0..=100",
                    def.name, def.level_rank
                )));
            }
            if !seen.insert(def.name) {
                return Err(RbacError::invalid_role(format!("{} is defined twice", def.name)));
            }
            if let Some(code) = def
                .permissions
                .iter()
                .find(|code| code.as_str() != ALL_PERMISSIONS && !permissions::is_registered(code))
            {
                return Err(RbacError::PermissionNotFound { code: code.clone() });
            }
        }
        Ok(())
    }
}

/// Role definition in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDefinition {
    pub name: RoleName,
    pub display_name: String,
    pub level_rank: i16,
    #[serde(default)]
    pub description: String,
    /// Permission codes, or `*` for the whole registry
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl RoleDefinition {
    pub fn new(
        name: RoleName,
        display_name: &str,
        level_rank: i16,
        description: &str,
        permissions: Vec<&str>,
    ) -> Self {
        Self {
            name,
            display_name: display_name.to_string(),
            level_rank,
            description: description.to_string(),
            permissions: permissions.into_iter().map(String::from).collect(),
        }
    }

    /// Permission codes with the wildcard expanded
    pub fn resolved_permissions(&self) -> Vec<String> {
        if self.permissions.iter().any(|p| p == ALL_PERMISSIONS) {
            return permissions::all_permissions().into_iter().map(String::from).collect();
        }
        self.permissions.clone()
    }
}

fn default_tenant_roles() -> Vec<RoleDefinition> {
    vec![
        RoleDefinition::new(
            RoleName::Principal,
            "Principal",
            1,
            "School owner with full control over the tenant",
            vec![ALL_PERMISSIONS],
        ),
        RoleDefinition::new(
            RoleName::Manager,
            "Branch Manager",
            2,
            "Manages day-to-day operations of a branch",
            vec![
                codes::STUDENT_VIEW,
                codes::STUDENT_CREATE,
                codes::STUDENT_EDIT,
                codes::STUDENT_ACTIVATE,
                codes::STUDENT_DEACTIVATE,
                codes::STUDENT_TRANSFER,
                codes::STUDENT_EXPORT,
                codes::PARENT_VIEW,
                codes::PARENT_CREATE,
                codes::PARENT_EDIT,
                codes::PARENT_LINK,
                codes::CLASS_VIEW,
                codes::CLASS_CREATE,
                codes::CLASS_EDIT,
                codes::CLASS_DELETE,
                codes::SECTION_VIEW,
                codes::SECTION_CREATE,
                codes::SECTION_EDIT,
                codes::SECTION_DELETE,
                codes::SUBJECT_VIEW,
                codes::SUBJECT_CREATE,
                codes::SUBJECT_EDIT,
                codes::SUBJECT_DELETE,
                codes::SUBJECT_ASSIGN,
                codes::TIMETABLE_VIEW,
                codes::TIMETABLE_CREATE,
                codes::TIMETABLE_EDIT,
                codes::ATTENDANCE_VIEW,
                codes::ATTENDANCE_MARK,
                codes::ATTENDANCE_EDIT,
                codes::ATTENDANCE_REPORT,
                codes::ATTENDANCE_EXPORT,
                codes::STAFF_ATTENDANCE_VIEW,
                codes::STAFF_ATTENDANCE_MARK,
                codes::STAFF_ATTENDANCE_EDIT,
                codes::STAFF_VIEW,
                codes::STAFF_CREATE,
                codes::STAFF_EDIT,
                codes::BRANCH_VIEW,
                codes::BRANCH_REPORT,
                codes::NOTIFICATION_VIEW,
                codes::NOTIFICATION_CREATE,
                codes::NOTIFICATION_SEND,
                codes::NOTIFICATION_BROADCAST,
                codes::REPORT_VIEW,
                codes::REPORT_GENERATE,
                codes::REPORT_EXPORT,
                codes::DASHBOARD_VIEW,
                codes::DASHBOARD_MANAGER,
            ],
        ),
        RoleDefinition::new(
            RoleName::Accountant,
            "Accountant",
            3,
            "Handles financial transactions and records",
            vec![
                codes::FEE_VIEW,
                codes::FEE_CREATE,
                codes::FEE_EDIT,
                codes::FEE_COLLECT,
                codes::FEE_REFUND,
                codes::FEE_REPORT,
                codes::EXPENSE_VIEW,
                codes::EXPENSE_CREATE,
                codes::SALARY_VIEW,
                codes::SALARY_PROCESS,
                codes::PAYMENT_VIEW,
                codes::PAYMENT_RECEIPT,
                codes::STUDENT_VIEW,
                codes::REPORT_VIEW,
                codes::REPORT_GENERATE,
                codes::REPORT_EXPORT,
                codes::DASHBOARD_VIEW,
            ],
        ),
        RoleDefinition::new(
            RoleName::Teacher,
            "Teacher",
            4,
            "Manages classes, attendance, and grades",
            vec![
                codes::STUDENT_VIEW,
                codes::ATTENDANCE_VIEW,
                codes::ATTENDANCE_MARK,
                codes::ATTENDANCE_EDIT,
                codes::CLASS_VIEW,
                codes::SECTION_VIEW,
                codes::SUBJECT_VIEW,
                codes::TIMETABLE_VIEW,
                codes::EXAM_VIEW,
                codes::RESULT_VIEW,
                codes::RESULT_ENTER,
                codes::NOTIFICATION_VIEW,
                codes::NOTIFICATION_CREATE,
                codes::NOTIFICATION_SEND,
                codes::DASHBOARD_VIEW,
                codes::DASHBOARD_TEACHER,
            ],
        ),
        RoleDefinition::new(
            RoleName::Employee,
            "Employee",
            5,
            "Non-teaching staff member",
            vec![
                codes::STUDENT_VIEW,
                codes::CLASS_VIEW,
                codes::STAFF_ATTENDANCE_VIEW,
                codes::STAFF_ATTENDANCE_MARK,
                codes::NOTIFICATION_VIEW,
                codes::DASHBOARD_VIEW,
            ],
        ),
        RoleDefinition::new(
            RoleName::Parent,
            "Parent",
            6,
            "Parent or guardian of students",
            vec![
                codes::STUDENT_VIEW,
                codes::ATTENDANCE_VIEW,
                codes::RESULT_VIEW,
                codes::FEE_VIEW,
                codes::NOTIFICATION_VIEW,
                codes::DASHBOARD_VIEW,
                codes::DASHBOARD_PARENT,
            ],
        ),
        RoleDefinition::new(
            RoleName::Student,
            "Student",
            7,
            "Enrolled student",
            vec![
                codes::STUDENT_VIEW,
                codes::ATTENDANCE_VIEW,
                codes::RESULT_VIEW,
                codes::CLASS_VIEW,
                codes::SUBJECT_VIEW,
                codes::TIMETABLE_VIEW,
                codes::NOTIFICATION_VIEW,
                codes::DASHBOARD_VIEW,
                codes::DASHBOARD_STUDENT,
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RbacConfig::default();
        config.validate().unwrap();
        assert!(config.allow_superuser_bypass);
        assert!(config.enable_audit_logging);
        assert_eq!(config.tenant_roles.len(), 7);
    }

    #[test]
    fn test_default_ranks() {
        let config = RbacConfig::default();
        let ranks: Vec<(RoleName, i16)> = config.tenant_roles.iter().map(|r| (r.name, r.level_rank)).collect();
        assert_eq!(
            ranks,
            vec![
                (RoleName::Principal, 1),
                (RoleName::Manager, 2),
                (RoleName::Accountant, 3),
                (RoleName::Teacher, 4),
                (RoleName::Employee, 5),
                (RoleName::Parent, 6),
                (RoleName::Student, 7),
            ]
        );
        assert_eq!(config.system_role.level_rank, 0);
    }

    #[test]
    fn test_wildcard_expands_to_registry() {
        let config = RbacConfig::default();
        let principal = config.tenant_role(RoleName::Principal).unwrap();
        assert_eq!(principal.resolved_permissions().len(), permissions::all_permissions().len());

        let teacher = config.tenant_role(RoleName::Teacher).unwrap();
        assert_eq!(teacher.resolved_permissions().len(), 16);
    }

    #[test]
    fn test_validate_rejects_unknown_code() {
        let mut config = RbacConfig::default();
        config.tenant_roles[3].permissions.push("teacher.fly".to_string());
        assert!(matches!(config.validate(), Err(RbacError::PermissionNotFound { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_ranks() {
        let mut config = RbacConfig::default();
        config.tenant_roles.push(config.tenant_roles[0].clone());
        assert!(matches!(config.validate(), Err(RbacError::InvalidRole { .. })));

        let mut config = RbacConfig::default();
        config.tenant_roles[0].level_rank = 101;
        assert!(matches!(config.validate(), Err(RbacError::InvalidRole { .. })));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RbacConfig = serde_json::from_str(r#"{"allow_superuser_bypass": false}"#).unwrap();
        assert!(!config.allow_superuser_bypass);
        assert_eq!(config.tenant_roles.len(), 7);
    }
}
