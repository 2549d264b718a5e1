//! Permission registry
//!
//! The closed catalogue of permission codes. Codes have the form
//! `prefix.action` where the action may itself contain dots
//! (`staff.attendance.view`). Every code belongs to one of the storage
//! categories in [`PermissionCategory`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage category of a permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionCategory {
    Student,
    Academic,
    Attendance,
    Finance,
    Exam,
    Staff,
    Notification,
    Report,
    System,
    Branch,
}

impl PermissionCategory {
    pub const ALL: [PermissionCategory; 10] = [
        PermissionCategory::Student,
        PermissionCategory::Academic,
        PermissionCategory::Attendance,
        PermissionCategory::Finance,
        PermissionCategory::Exam,
        PermissionCategory::Staff,
        PermissionCategory::Notification,
        PermissionCategory::Report,
        PermissionCategory::System,
        PermissionCategory::Branch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionCategory::Student => "student",
            PermissionCategory::Academic => "academic",
            PermissionCategory::Attendance => "attendance",
            PermissionCategory::Finance => "finance",
            PermissionCategory::Exam => "exam",
            PermissionCategory::Staff => "staff",
            PermissionCategory::Notification => "notification",
            PermissionCategory::Report => "report",
            PermissionCategory::System => "system",
            PermissionCategory::Branch => "branch",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PermissionCategory::Student => "Student Management",
            PermissionCategory::Academic => "Academic Management",
            PermissionCategory::Attendance => "Attendance Management",
            PermissionCategory::Finance => "Finance Management",
            PermissionCategory::Exam => "Exam & Result Management",
            PermissionCategory::Staff => "Staff Management",
            PermissionCategory::Notification => "Notification Management",
            PermissionCategory::Report => "Report Generation",
            PermissionCategory::System => "System Administration",
            PermissionCategory::Branch => "Branch Management",
        }
    }

    /// Category a code is stored under. Unknown prefixes fall back to `System`.
    pub fn for_code(code: &str) -> Self {
        if let Some(def) = definition(code) {
            return def.category;
        }

        match code.split('.').next().unwrap_or_default() {
            "student" | "parent" => PermissionCategory::Student,
            "class" | "section" | "subject" | "timetable" => PermissionCategory::Academic,
            "attendance" => PermissionCategory::Attendance,
            "staff" if code.starts_with("staff.attendance.") => PermissionCategory::Attendance,
            "staff" => PermissionCategory::Staff,
            "fee" | "expense" | "salary" | "payment" => PermissionCategory::Finance,
            "exam" | "result" | "grade" => PermissionCategory::Exam,
            "notification" => PermissionCategory::Notification,
            "report" => PermissionCategory::Report,
            "branch" => PermissionCategory::Branch,
            _ => PermissionCategory::System,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the static catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionDefinition {
    pub code: &'static str,
    pub description: &'static str,
    pub category: PermissionCategory,
}

impl PermissionDefinition {
    /// Leading segment of the code, e.g. `staff` for `staff.attendance.view`
    pub fn prefix(&self) -> &'static str {
        self.code.split_once('.').map(|(p, _)| p).unwrap_or(self.code)
    }

    /// Everything after the prefix
    pub fn action(&self) -> &'static str {
        self.code.split_once('.').map(|(_, a)| a).unwrap_or("")
    }

    /// Human readable name, `Staff Attendance view` for `staff.attendance.view`
    pub fn name(&self) -> String {
        let action = self.action().replace(['_', '.'], " ");
        format!("{} {}", capitalize(self.prefix()), capitalize(&action))
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

macro_rules! permission_catalogue {
    ($( $category:ident { $( $name:ident = $code:literal => $description:literal, )* } )*) => {
        /// Permission code constants
        pub mod codes {
            $( $( pub const $name: &str = $code; )* )*
        }

        static DEFINITIONS: &[PermissionDefinition] = &[
            $( $(
                PermissionDefinition {
                    code: $code,
                    description: $description,
                    category: PermissionCategory::$category,
                },
            )* )*
        ];
    };
}

permission_catalogue! {
    Student {
        STUDENT_VIEW = "student.view" => "View student details",
        STUDENT_CREATE = "student.create" => "Create new students",
        STUDENT_EDIT = "student.edit" => "Edit student information",
        STUDENT_DELETE = "student.delete" => "Delete students",
        STUDENT_IMPORT = "student.import" => "Import students from file",
        STUDENT_EXPORT = "student.export" => "Export student data",
        STUDENT_ACTIVATE = "student.activate" => "Activate students",
        STUDENT_DEACTIVATE = "student.deactivate" => "Deactivate students",
        STUDENT_TRANSFER = "student.transfer" => "Transfer students between branches",
        PARENT_VIEW = "parent.view" => "View parent details",
        PARENT_CREATE = "parent.create" => "Create parent accounts",
        PARENT_EDIT = "parent.edit" => "Edit parent information",
        PARENT_LINK = "parent.link" => "Link parents to students",
    }
    Academic {
        CLASS_VIEW = "class.view" => "View classes",
        CLASS_CREATE = "class.create" => "Create classes",
        CLASS_EDIT = "class.edit" => "Edit classes",
        CLASS_DELETE = "class.delete" => "Delete classes",
        SECTION_VIEW = "section.view" => "View sections",
        SECTION_CREATE = "section.create" => "Create sections",
        SECTION_EDIT = "section.edit" => "Edit sections",
        SECTION_DELETE = "section.delete" => "Delete sections",
        SUBJECT_VIEW = "subject.view" => "View subjects",
        SUBJECT_CREATE = "subject.create" => "Create subjects",
        SUBJECT_EDIT = "subject.edit" => "Edit subjects",
        SUBJECT_DELETE = "subject.delete" => "Delete subjects",
        SUBJECT_ASSIGN = "subject.assign" => "Assign teachers to subjects",
        TIMETABLE_VIEW = "timetable.view" => "View timetables",
        TIMETABLE_CREATE = "timetable.create" => "Create timetables",
        TIMETABLE_EDIT = "timetable.edit" => "Edit timetables",
    }
    Attendance {
        ATTENDANCE_VIEW = "attendance.view" => "View attendance",
        ATTENDANCE_MARK = "attendance.mark" => "Mark attendance",
        ATTENDANCE_EDIT = "attendance.edit" => "Edit attendance",
        ATTENDANCE_REPORT = "attendance.report" => "Generate attendance reports",
        ATTENDANCE_EXPORT = "attendance.export" => "Export attendance data",
        STAFF_ATTENDANCE_VIEW = "staff.attendance.view" => "View staff attendance",
        STAFF_ATTENDANCE_MARK = "staff.attendance.mark" => "Mark staff attendance",
        STAFF_ATTENDANCE_EDIT = "staff.attendance.edit" => "Edit staff attendance",
    }
    Finance {
        FEE_VIEW = "fee.view" => "View fees",
        FEE_CREATE = "fee.create" => "Create fee structures",
        FEE_EDIT = "fee.edit" => "Edit fees",
        FEE_COLLECT = "fee.collect" => "Collect payments",
        FEE_REFUND = "fee.refund" => "Process refunds",
        FEE_REPORT = "fee.report" => "Generate fee reports",
        EXPENSE_VIEW = "expense.view" => "View expenses",
        EXPENSE_CREATE = "expense.create" => "Create expenses",
        EXPENSE_APPROVE = "expense.approve" => "Approve expenses",
        SALARY_VIEW = "salary.view" => "View salaries",
        SALARY_PROCESS = "salary.process" => "Process salary payments",
        SALARY_APPROVE = "salary.approve" => "Approve salary sheets",
        PAYMENT_VIEW = "payment.view" => "View payments",
        PAYMENT_RECEIPT = "payment.receipt" => "Generate receipts",
    }
    Exam {
        EXAM_VIEW = "exam.view" => "View exams",
        EXAM_CREATE = "exam.create" => "Create exams",
        EXAM_EDIT = "exam.edit" => "Edit exams",
        EXAM_PUBLISH = "exam.publish" => "Publish exam schedules",
        RESULT_VIEW = "result.view" => "View results",
        RESULT_ENTER = "result.enter" => "Enter marks",
        RESULT_EDIT = "result.edit" => "Edit results",
        RESULT_PUBLISH = "result.publish" => "Publish results",
        RESULT_EXPORT = "result.export" => "Export results",
        GRADE_VIEW = "grade.view" => "View grades",
        GRADE_CREATE = "grade.create" => "Create grade scales",
    }
    Staff {
        STAFF_VIEW = "staff.view" => "View staff",
        STAFF_CREATE = "staff.create" => "Create staff",
        STAFF_EDIT = "staff.edit" => "Edit staff",
        STAFF_TERMINATE = "staff.terminate" => "Terminate staff",
        STAFF_PROMOTE = "staff.promote" => "Promote staff",
        STAFF_SALARY_VIEW = "staff.salary.view" => "View individual staff salary",
        STAFF_SALARY_SET = "staff.salary.set" => "Set individual staff salary",
    }
    Branch {
        BRANCH_VIEW = "branch.view" => "View branches",
        BRANCH_CREATE = "branch.create" => "Create branches",
        BRANCH_EDIT = "branch.edit" => "Edit branches",
        BRANCH_MANAGER_ASSIGN = "branch.manager.assign" => "Assign branch managers",
        BRANCH_REPORT = "branch.report" => "Generate branch reports",
    }
    Notification {
        NOTIFICATION_VIEW = "notification.view" => "View notifications",
        NOTIFICATION_CREATE = "notification.create" => "Create notifications",
        NOTIFICATION_SEND = "notification.send" => "Send notifications",
        NOTIFICATION_BROADCAST = "notification.broadcast" => "Broadcast to all users",
    }
    Report {
        REPORT_VIEW = "report.view" => "View reports",
        REPORT_GENERATE = "report.generate" => "Generate reports",
        REPORT_EXPORT = "report.export" => "Export reports",
        REPORT_SCHEDULE = "report.schedule" => "Schedule reports",
    }
    System {
        USER_VIEW = "user.view" => "View users",
        USER_CREATE = "user.create" => "Create users",
        USER_EDIT = "user.edit" => "Edit users",
        USER_ACTIVATE = "user.activate" => "Activate users",
        USER_DEACTIVATE = "user.deactivate" => "Deactivate users",
        USER_ROLE_ASSIGN = "user.role.assign" => "Assign roles to users",
        ROLE_VIEW = "role.view" => "View roles",
        ROLE_CREATE = "role.create" => "Create roles",
        ROLE_EDIT = "role.edit" => "Edit roles",
        ROLE_DELETE = "role.delete" => "Delete roles",
        PERMISSION_ASSIGN = "permission.assign" => "Assign permissions to roles",
        AUDIT_LOG_VIEW = "audit.log.view" => "View audit logs",
        DASHBOARD_VIEW = "dashboard.view" => "View dashboard",
        DASHBOARD_PRINCIPAL = "dashboard.principal" => "Access principal dashboard",
        DASHBOARD_MANAGER = "dashboard.manager" => "Access manager dashboard",
        DASHBOARD_TEACHER = "dashboard.teacher" => "Access teacher dashboard",
        DASHBOARD_PARENT = "dashboard.parent" => "Access parent dashboard",
        DASHBOARD_STUDENT = "dashboard.student" => "Access student dashboard",
    }
}

/// The full static catalogue in declaration order
pub fn definitions() -> &'static [PermissionDefinition] {
    DEFINITIONS
}

/// Every registered code
pub fn all_permissions() -> Vec<&'static str> {
    DEFINITIONS.iter().map(|d| d.code).collect()
}

/// Codes whose prefix is `prefix`
pub fn by_category(prefix: &str) -> Vec<&'static str> {
    DEFINITIONS
        .iter()
        .filter(|d| d.prefix() == prefix)
        .map(|d| d.code)
        .collect()
}

/// Codes grouped by prefix, groups ordered by first appearance in the catalogue
pub fn permission_matrix() -> Vec<(&'static str, Vec<&'static str>)> {
    let mut matrix: Vec<(&'static str, Vec<&'static str>)> = Vec::new();
    for def in DEFINITIONS {
        match matrix.iter_mut().find(|(prefix, _)| *prefix == def.prefix()) {
            Some((_, codes)) => codes.push(def.code),
            None => matrix.push((def.prefix(), vec![def.code])),
        }
    }
    matrix
}

pub fn definition(code: &str) -> Option<&'static PermissionDefinition> {
    DEFINITIONS.iter().find(|d| d.code == code)
}

pub fn is_registered(code: &str) -> bool {
    definition(code).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let all = all_permissions();
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());
    }

    #[test]
    fn test_by_category_matches_prefix_only() {
        let staff = by_category("staff");
        assert!(staff.contains(&codes::STAFF_VIEW));
        assert!(staff.contains(&codes::STAFF_ATTENDANCE_EDIT));
        assert!(!staff.contains(&codes::STUDENT_VIEW));
        assert!(by_category("stud").is_empty());
    }

    #[test]
    fn test_permission_matrix_covers_catalogue() {
        let matrix = permission_matrix();
        let total: usize = matrix.iter().map(|(_, codes)| codes.len()).sum();
        assert_eq!(total, all_permissions().len());
        assert_eq!(matrix[0].0, "student");
        assert_eq!(matrix[0].1[0], codes::STUDENT_VIEW);
    }

    #[test]
    fn test_derived_names() {
        assert_eq!(definition("student.create").unwrap().name(), "Student Create");
        assert_eq!(definition("staff.attendance.view").unwrap().name(), "Staff Attendance view");
        assert_eq!(definition("audit.log.view").unwrap().name(), "Audit Log view");
    }

    #[test]
    fn test_category_lookup() {
        assert_eq!(PermissionCategory::for_code(codes::FEE_COLLECT), PermissionCategory::Finance);
        assert_eq!(PermissionCategory::for_code(codes::STAFF_ATTENDANCE_MARK), PermissionCategory::Attendance);
        assert_eq!(PermissionCategory::for_code(codes::DASHBOARD_VIEW), PermissionCategory::System);
        assert_eq!(PermissionCategory::for_code("library.borrow"), PermissionCategory::System);
    }

    #[test]
    fn test_prefix_fallback_agrees_with_catalogue() {
        for def in definitions() {
            let unregistered = format!("{}.probe", def.code);
            assert_eq!(PermissionCategory::for_code(&unregistered), def.category, "{}", def.code);
        }
    }

    #[test]
    fn test_registration() {
        assert!(is_registered(codes::SECTION_DELETE));
        assert!(is_registered(codes::SUBJECT_DELETE));
        assert!(!is_registered("student.fly"));
        assert_eq!(PermissionCategory::parse("exam"), Some(PermissionCategory::Exam));
        assert_eq!(PermissionCategory::parse("bogus"), None);
    }
}
