//! Role assignment ledger: replacement, hierarchy and audit isolation

mod common;

use async_trait::async_trait;
use campus_rbac::{
    codes, AuditEntry, AuditSink, NewUser, RbacConfig, RbacError, RbacResult, RbacSeeder, RoleName,
};
use chrono::{Duration, Utc};
use common::{principal, Fixture};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

struct FailingSink {
    calls: AtomicUsize,
}

#[async_trait]
impl AuditSink for FailingSink {
    async fn record(&self, _entry: AuditEntry) -> RbacResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RbacError::internal("audit store unavailable"))
    }
}

#[tokio::test]
async fn test_reassignment_keeps_one_active_row() {
    let fx = Fixture::new().await;
    let teacher = fx.role_with(RoleName::Teacher, 4, &[codes::ATTENDANCE_MARK]).await;
    let user = fx.user("t@greenfield.test").await;

    let first = fx
        .service
        .assign_role(user.id, &teacher, Some(fx.north.id), None, None)
        .await
        .unwrap();
    let second = fx
        .service
        .assign_role(
            user.id,
            &teacher,
            Some(fx.north.id),
            None,
            Some(Utc::now() + Duration::days(90)),
        )
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(fx.test_db.count_records("user_roles").await.unwrap(), 2);

    let active = fx.service.get_user_roles(user.id, None, true).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].assignment.id, second.id);

    let history = fx.service.get_user_roles(user.id, None, false).await.unwrap();
    let replaced = history.iter().find(|a| a.assignment.id == first.id).unwrap();
    assert!(!replaced.assignment.is_active);
}

#[tokio::test]
async fn test_assignments_in_different_branches_coexist() {
    let fx = Fixture::new().await;
    let teacher = fx.role(RoleName::Teacher, 4).await;
    let user = fx.user("t@greenfield.test").await;

    fx.service
        .assign_role(user.id, &teacher, Some(fx.north.id), None, None)
        .await
        .unwrap();
    fx.service
        .assign_role(user.id, &teacher, Some(fx.south.id), None, None)
        .await
        .unwrap();
    fx.service.assign_role(user.id, &teacher, None, None, None).await.unwrap();

    assert_eq!(fx.service.get_user_roles(user.id, None, true).await.unwrap().len(), 3);
    assert_eq!(
        fx.service
            .get_user_roles(user.id, Some(fx.north.id), true)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_hierarchy_limits_assign_and_revoke() {
    let fx = Fixture::new().await;
    let employee = fx.role(RoleName::Employee, 5).await;
    let accountant = fx.role(RoleName::Accountant, 3).await;
    let student = fx.role(RoleName::Student, 8).await;

    let actor = fx.user("actor@greenfield.test").await;
    fx.service.assign_role(actor.id, &employee, None, None, None).await.unwrap();
    let actor = principal(&actor);

    let target = fx.user("target@greenfield.test").await;

    assert!(!fx.service.can_manage_role(&actor, &accountant).await.unwrap());
    assert!(!fx.service.can_manage_role(&actor, &employee).await.unwrap());
    assert!(fx.service.can_manage_role(&actor, &student).await.unwrap());

    let err = fx
        .service
        .assign_role(target.id, &accountant, None, Some(&actor), None)
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::AuthorizationDenied { .. }));

    let granted = fx
        .service
        .assign_role(target.id, &student, None, Some(&actor), None)
        .await
        .unwrap();
    assert_eq!(granted.assigned_by, actor.user_id());

    let system_grant = fx
        .service
        .assign_role(target.id, &accountant, None, None, None)
        .await
        .unwrap();
    let err = fx.service.revoke_role(&system_grant, Some(&actor)).await.unwrap_err();
    assert!(err.is_permission_denied());

    let revoked = fx.service.revoke_role(&granted, Some(&actor)).await.unwrap();
    assert!(!revoked.is_active);
}

#[tokio::test]
async fn test_actor_without_roles_manages_nothing() {
    let fx = Fixture::new().await;
    let student = fx.role(RoleName::Student, 8).await;
    let actor = principal(&fx.user("nobody@greenfield.test").await);
    let target = fx.user("target@greenfield.test").await;

    let err = fx
        .service
        .assign_role(target.id, &student, None, Some(&actor), None)
        .await
        .unwrap_err();
    assert!(err.is_permission_denied());

    let root = principal(&fx.superuser("root@campus.test").await);
    fx.service
        .assign_role(target.id, &student, None, Some(&root), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_audit_failure_does_not_change_results() {
    let fx = Fixture::new().await;
    let sink = Arc::new(FailingSink {
        calls: AtomicUsize::new(0),
    });
    let service = fx.service.clone().with_audit_sink(sink.clone());

    let teacher = fx.role_with(RoleName::Teacher, 4, &[codes::EXAM_VIEW]).await;
    let user = fx.user("t@greenfield.test").await;
    let p = principal(&user);

    let assignment = service.assign_role(user.id, &teacher, None, None, None).await.unwrap();
    assert!(assignment.is_active);
    assert!(service.user_has_permission(&p, codes::EXAM_VIEW, None).await.unwrap());
    assert!(!service.user_has_permission(&p, codes::EXAM_EDIT, None).await.unwrap());

    let revoked = service.revoke_role(&assignment, None).await.unwrap();
    assert!(!revoked.is_active);
    assert!(!service.user_has_permission(&p, codes::EXAM_VIEW, None).await.unwrap());

    assert_eq!(sink.calls.load(Ordering::SeqCst), 5);
    assert_eq!(fx.test_db.count_records("permission_audit_logs").await.unwrap(), 0);
}

#[tokio::test]
async fn test_role_changes_are_audited() {
    let fx = Fixture::new().await;
    let teacher = fx.role(RoleName::Teacher, 4).await;
    let user = fx.user("t@greenfield.test").await;
    let root = principal(&fx.superuser("root@campus.test").await);

    let assignment = fx
        .service
        .assign_role(user.id, &teacher, None, Some(&root), None)
        .await
        .unwrap();
    fx.service.revoke_role(&assignment, None).await.unwrap();

    let entries = fx.service.recent_audit_entries(Some(user.id), 10).await.unwrap();
    let reasons: Vec<&str> = entries.iter().map(|e| e.reason.as_str()).collect();
    assert!(reasons.contains(&"Role teacher granted by root@campus.test"));
    assert!(reasons.contains(&"Role teacher revoked by system"));
    assert!(entries.iter().all(|e| e.granted));
}

#[tokio::test]
async fn test_assignment_reference_errors() {
    let fx = Fixture::new().await;
    let teacher = fx.role(RoleName::Teacher, 4).await;
    let user = fx.user("t@greenfield.test").await;

    let err = fx.service.assign_role(9999, &teacher, None, None, None).await.unwrap_err();
    assert!(matches!(err, RbacError::UserNotFound { user_id: 9999 }));

    let err = fx
        .service
        .assign_role(user.id, &teacher, Some(9999), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::BranchNotFound { branch_id: 9999 }));

    let other = fx.manager.create_tenant("riverside", "Riverside Academy").await.unwrap();
    let elsewhere = fx.manager.create_branch(other.id, "Main", None).await.unwrap();
    let err = fx
        .service
        .assign_role(user.id, &teacher, Some(elsewhere.id), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::InvalidRole { .. }));

    let err = fx.service.revoke_assignment(4242, None).await.unwrap_err();
    assert!(err.is_not_found());

    let err = fx
        .service
        .assign_role_by_name(user.id, Some(fx.tenant.id), RoleName::Principal, None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RbacError::RoleNotFound { .. }));

    assert_eq!(fx.test_db.count_records("user_roles").await.unwrap(), 0);
}

#[tokio::test]
async fn test_new_user_receives_default_role() {
    let fx = Fixture::new().await;
    RbacSeeder::new(fx.db().clone(), RbacConfig::default())
        .seed_for_tenant(fx.tenant.id, false)
        .await
        .unwrap();

    let teacher = fx
        .manager
        .create_user(
            NewUser::new("teacher@greenfield.test")
                .in_tenant(fx.tenant.id)
                .with_type(RoleName::Teacher),
        )
        .await
        .unwrap();

    let roles = fx.service.get_user_roles(teacher.id, None, true).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].role.name, RoleName::Teacher);
    assert_eq!(roles[0].role.tenant_id, Some(fx.tenant.id));
    assert!(roles[0].assignment.is_tenant_wide());

    let p = principal(&teacher);
    assert!(fx
        .service
        .user_has_permission(&p, codes::ATTENDANCE_MARK, Some(fx.south.id))
        .await
        .unwrap());
    assert!(!fx.service.user_has_permission(&p, codes::FEE_COLLECT, None).await.unwrap());
}

#[tokio::test]
async fn test_selectors_report_holders_and_branch_summary() {
    let fx = Fixture::new().await;
    RbacSeeder::new(fx.db().clone(), RbacConfig::default())
        .seed_for_tenant(fx.tenant.id, false)
        .await
        .unwrap();
    let selectors = fx.service.selectors();
    let teacher = selectors
        .role_by_name(Some(fx.tenant.id), RoleName::Teacher)
        .await
        .unwrap()
        .unwrap();
    let parent = selectors
        .role_by_name(Some(fx.tenant.id), RoleName::Parent)
        .await
        .unwrap()
        .unwrap();

    let alice = fx.user("alice@greenfield.test").await;
    let bob = fx.user("bob@greenfield.test").await;
    let carol = fx.user("carol@greenfield.test").await;

    fx.service
        .assign_role(alice.id, &teacher, Some(fx.north.id), None, None)
        .await
        .unwrap();
    fx.service.assign_role(alice.id, &teacher, None, None, None).await.unwrap();
    fx.service
        .assign_role(bob.id, &teacher, Some(fx.south.id), None, None)
        .await
        .unwrap();
    fx.service.assign_role(carol.id, &parent, None, None, None).await.unwrap();

    let north = selectors.role_summary_for_branch(fx.north.id).await.unwrap();
    assert_eq!(north.get(&RoleName::Teacher), Some(&1));
    assert_eq!(north.get(&RoleName::Parent), Some(&1));

    let holders = selectors.users_by_role(teacher.id, Some(fx.south.id), true).await.unwrap();
    assert_eq!(holders.len(), 1);
    assert_eq!(holders[0].user.id, bob.id);
    assert_eq!(selectors.users_by_role(teacher.id, None, true).await.unwrap().len(), 3);

    let err = selectors.role_summary_for_branch(9999).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_audit_table_does_not_change_results() {
    let fx = Fixture::new().await;
    let teacher = fx.role_with(RoleName::Teacher, 4, &[codes::EXAM_VIEW]).await;
    let user = fx.user("t@greenfield.test").await;
    let p = principal(&user);

    fx.test_db.drop_table("permission_audit_logs").await.unwrap();

    let assignment = fx.service.assign_role(user.id, &teacher, None, None, None).await.unwrap();
    assert!(fx.service.user_has_permission(&p, codes::EXAM_VIEW, None).await.unwrap());
    assert!(!fx.service.user_has_permission(&p, codes::EXAM_EDIT, None).await.unwrap());
    fx.service.revoke_role(&assignment, None).await.unwrap();

    assert!(fx.service.recent_audit_entries(Some(user.id), 10).await.is_err());
}

#[tokio::test]
async fn test_role_by_name_prefers_tenant_role() {
    use campus_storage::seaorm::entities::roles;
    use sea_orm::{ActiveModelBehavior, ActiveModelTrait, Set};

    let fx = Fixture::new().await;
    let system_teacher: campus_rbac::Role = roles::ActiveModel {
        name: Set(RoleName::Teacher),
        display_name: Set("Teacher".to_string()),
        level_rank: Set(4),
        tenant_id: Set(None),
        is_system_role: Set(true),
        ..ActiveModelBehavior::new()
    }
    .insert(fx.db())
    .await
    .unwrap()
    .into();
    let tenant_teacher = fx.role(RoleName::Teacher, 4).await;
    let selectors = fx.service.selectors();

    let found = selectors
        .role_by_name(Some(fx.tenant.id), RoleName::Teacher)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, tenant_teacher.id);

    let other = fx.manager.create_tenant("riverside", "Riverside Academy").await.unwrap();
    let found = selectors.role_by_name(Some(other.id), RoleName::Teacher).await.unwrap().unwrap();
    assert_eq!(found.id, system_teacher.id);

    let found = selectors.role_by_name(None, RoleName::Teacher).await.unwrap().unwrap();
    assert_eq!(found.id, system_teacher.id);
    assert!(selectors.role_by_name(None, RoleName::Parent).await.unwrap().is_none());
}
