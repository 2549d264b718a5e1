//! Permission checks against a real migrated database

mod common;

use campus_rbac::{
    codes, models::AuditAction, permissions, Principal, RbacConfig, RbacError, RoleName,
};
use chrono::{Duration, Utc};
use common::{principal, Fixture};

#[tokio::test]
async fn test_manager_scenario_branch_scope_and_revoke() {
    let fx = Fixture::new().await;
    let manager_role = fx.role_with(RoleName::Manager, 2, &[codes::STUDENT_CREATE]).await;
    fx.role(RoleName::Teacher, 4).await;

    let user = fx.user("u@greenfield.test").await;
    let u = principal(&user);
    let assignment = fx
        .service
        .assign_role(user.id, &manager_role, Some(fx.north.id), None, None)
        .await
        .unwrap();

    assert!(fx
        .service
        .user_has_permission(&u, codes::STUDENT_CREATE, Some(fx.north.id))
        .await
        .unwrap());
    assert!(!fx
        .service
        .user_has_permission(&u, codes::STUDENT_CREATE, Some(fx.south.id))
        .await
        .unwrap());

    fx.service.revoke_role(&assignment, None).await.unwrap();

    assert!(!fx
        .service
        .user_has_permission(&u, codes::STUDENT_CREATE, Some(fx.north.id))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_validity_window_controls_checks() {
    let fx = Fixture::new().await;
    let teacher = fx.role_with(RoleName::Teacher, 4, &[codes::ATTENDANCE_MARK]).await;
    let now = Utc::now();

    let expired = fx.user("expired@greenfield.test").await;
    fx.service
        .assign_role(expired.id, &teacher, None, None, Some(now - Duration::hours(1)))
        .await
        .unwrap();

    let bounded = fx.user("bounded@greenfield.test").await;
    fx.service
        .assign_role(bounded.id, &teacher, None, None, Some(now + Duration::days(30)))
        .await
        .unwrap();

    let open = fx.user("open@greenfield.test").await;
    fx.service.assign_role(open.id, &teacher, None, None, None).await.unwrap();

    for (user, expected) in [(&expired, false), (&bounded, true), (&open, true)] {
        let granted = fx
            .service
            .user_has_permission(&principal(user), codes::ATTENDANCE_MARK, None)
            .await
            .unwrap();
        assert_eq!(granted, expected, "{}", user.email);
    }

    assert!(fx.service.get_user_roles(expired.id, None, true).await.unwrap().is_empty());
    let history = fx.service.get_user_roles(expired.id, None, false).await.unwrap();
    assert_eq!(history.len(), 1);
    assert!(!history[0].assignment.is_valid());
}

#[tokio::test]
async fn test_tenant_wide_assignment_covers_every_branch() {
    let fx = Fixture::new().await;
    let accountant = fx.role_with(RoleName::Accountant, 3, &[codes::FEE_COLLECT]).await;
    let user = fx.user("acc@greenfield.test").await;
    let p = principal(&user);

    fx.service.assign_role(user.id, &accountant, None, None, None).await.unwrap();

    for branch in [Some(fx.north.id), Some(fx.south.id), None] {
        assert!(fx.service.user_has_permission(&p, codes::FEE_COLLECT, branch).await.unwrap());
    }
}

#[tokio::test]
async fn test_inactive_permission_never_grants() {
    let fx = Fixture::new().await;
    let teacher = fx.role_with(RoleName::Teacher, 4, &[codes::RESULT_ENTER]).await;
    let user = fx.user("t@greenfield.test").await;
    let p = principal(&user);
    fx.service.assign_role(user.id, &teacher, None, None, None).await.unwrap();

    assert!(fx.service.user_has_permission(&p, codes::RESULT_ENTER, None).await.unwrap());

    let permission = fx.service.set_permission_active(codes::RESULT_ENTER, false).await.unwrap();
    assert!(!permission.is_active);
    assert!(!fx.service.user_has_permission(&p, codes::RESULT_ENTER, None).await.unwrap());
    assert!(fx.service.get_user_permissions(&p, None).await.unwrap().is_empty());

    // The link itself is untouched
    assert_eq!(fx.test_db.count_records("role_permissions").await.unwrap(), 1);

    fx.service.set_permission_active(codes::RESULT_ENTER, true).await.unwrap();
    assert!(fx.service.user_has_permission(&p, codes::RESULT_ENTER, None).await.unwrap());
}

#[tokio::test]
async fn test_permission_not_granted_by_any_role() {
    let fx = Fixture::new().await;
    let teacher = fx.role_with(RoleName::Teacher, 4, &[codes::STUDENT_VIEW]).await;
    let user = fx.user("t@greenfield.test").await;
    let p = principal(&user);

    assert!(!fx.service.user_has_permission(&p, codes::STUDENT_VIEW, None).await.unwrap());

    fx.service.assign_role(user.id, &teacher, None, None, None).await.unwrap();
    assert!(fx.service.user_has_permission(&p, codes::STUDENT_VIEW, None).await.unwrap());
    assert!(!fx.service.user_has_permission(&p, codes::FEE_REFUND, None).await.unwrap());

    let entries = fx.service.recent_audit_entries(Some(user.id), 10).await.unwrap();
    let reasons: Vec<&str> = entries
        .iter()
        .filter(|e| e.action == AuditAction::Check)
        .map(|e| e.reason.as_str())
        .collect();
    assert!(reasons.contains(&"No valid roles found"));
    assert!(reasons.contains(&"Granted through a valid role"));
    assert!(reasons.contains(&"No valid role grants this permission"));
}

#[tokio::test]
async fn test_superuser_bypasses_roles() {
    let fx = Fixture::new().await;
    let root = fx.superuser("root@campus.test").await;
    let p = principal(&root);

    assert!(fx.service.user_has_permission(&p, codes::SALARY_APPROVE, None).await.unwrap());
    assert!(fx
        .service
        .user_has_permission(&p, codes::BRANCH_CREATE, Some(fx.south.id))
        .await
        .unwrap());
    fx.service.require_permission(&p, codes::AUDIT_LOG_VIEW, None).await.unwrap();

    let all = fx.service.get_user_permissions(&p, None).await.unwrap();
    assert_eq!(all.len(), permissions::all_permissions().len());
}

#[tokio::test]
async fn test_superuser_bypass_can_be_disabled() {
    let config = RbacConfig {
        allow_superuser_bypass: false,
        ..RbacConfig::default()
    };
    let fx = Fixture::with_config(config).await;
    let root = fx.superuser("root@campus.test").await;

    assert!(!fx
        .service
        .user_has_permission(&principal(&root), codes::SALARY_APPROVE, None)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_anonymous_is_denied_and_audited() {
    let fx = Fixture::new().await;

    assert!(!fx
        .service
        .user_has_permission(&Principal::Anonymous, codes::STUDENT_VIEW, None)
        .await
        .unwrap());

    let err = fx
        .service
        .require_permission(&Principal::Anonymous, codes::STUDENT_VIEW, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::Unauthenticated));

    let entries = fx.service.recent_audit_entries(None, 10).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.user_id.is_none() && !e.granted));
    assert_eq!(entries[0].reason, "User not authenticated");
}

#[tokio::test]
async fn test_require_permission_reports_user_and_code() {
    let fx = Fixture::new().await;
    let user = fx.user("clerk@greenfield.test").await;

    let err = fx
        .service
        .require_permission(&principal(&user), codes::FEE_REFUND, None)
        .await
        .unwrap_err();

    assert!(err.is_permission_denied());
    assert_eq!(
        err.to_string(),
        "User clerk@greenfield.test does not have permission: fee.refund"
    );
}

#[tokio::test]
async fn test_any_and_all_permission_checks() {
    let fx = Fixture::new().await;
    let parent = fx
        .role_with(RoleName::Parent, 6, &[codes::FEE_VIEW, codes::RESULT_VIEW])
        .await;
    let user = fx.user("p@greenfield.test").await;
    let p = principal(&user);
    fx.service.assign_role(user.id, &parent, None, None, None).await.unwrap();

    assert!(fx
        .service
        .user_has_any_permission(&p, &[codes::FEE_COLLECT, codes::FEE_VIEW], None)
        .await
        .unwrap());
    assert!(!fx
        .service
        .user_has_any_permission(&p, &[codes::FEE_COLLECT, codes::FEE_REFUND], None)
        .await
        .unwrap());
    assert!(fx
        .service
        .user_has_all_permissions(&p, &[codes::FEE_VIEW, codes::RESULT_VIEW], None)
        .await
        .unwrap());
    assert!(!fx
        .service
        .user_has_all_permissions(&p, &[codes::FEE_VIEW, codes::FEE_COLLECT], None)
        .await
        .unwrap());

    assert_eq!(
        fx.service.get_user_permissions(&p, None).await.unwrap(),
        vec![codes::FEE_VIEW.to_string(), codes::RESULT_VIEW.to_string()]
    );
}

#[tokio::test]
async fn test_inactive_role_grants_nothing() {
    use campus_storage::seaorm::entities::{roles, Roles};
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};

    let fx = Fixture::new().await;
    let employee = fx.role_with(RoleName::Employee, 5, &[codes::STAFF_ATTENDANCE_MARK]).await;
    let user = fx.user("e@greenfield.test").await;
    let p = principal(&user);
    fx.service.assign_role(user.id, &employee, None, None, None).await.unwrap();

    let mut model: roles::ActiveModel = Roles::find_by_id(employee.id).one(fx.db()).await.unwrap().unwrap().into();
    model.is_active = Set(false);
    model.update(fx.db()).await.unwrap();

    assert!(!fx
        .service
        .user_has_permission(&p, codes::STAFF_ATTENDANCE_MARK, None)
        .await
        .unwrap());
    assert!(fx.service.valid_roles(user.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_any_and_all_audit_each_code_checked() {
    let fx = Fixture::new().await;
    let parent = fx.role_with(RoleName::Parent, 6, &[codes::FEE_VIEW]).await;
    let user = fx.user("p@greenfield.test").await;
    let p = principal(&user);
    fx.service.assign_role(user.id, &parent, None, None, None).await.unwrap();

    let audit = "permission_audit_logs";
    let before = fx.test_db.count_records(audit).await.unwrap();

    // Denied, then granted: two checks
    assert!(fx
        .service
        .user_has_any_permission(&p, &[codes::FEE_COLLECT, codes::FEE_VIEW], None)
        .await
        .unwrap());
    assert_eq!(fx.test_db.count_records(audit).await.unwrap(), before + 2);

    // Stops at the first grant
    assert!(fx
        .service
        .user_has_any_permission(&p, &[codes::FEE_VIEW, codes::FEE_COLLECT], None)
        .await
        .unwrap());
    assert_eq!(fx.test_db.count_records(audit).await.unwrap(), before + 3);

    // Stops at the first denial
    assert!(!fx
        .service
        .user_has_all_permissions(&p, &[codes::FEE_COLLECT, codes::FEE_VIEW], None)
        .await
        .unwrap());
    assert_eq!(fx.test_db.count_records(audit).await.unwrap(), before + 4);

    assert!(fx
        .service
        .user_has_all_permissions(&p, &[codes::FEE_VIEW], None)
        .await
        .unwrap());
    assert_eq!(fx.test_db.count_records(audit).await.unwrap(), before + 5);
}
