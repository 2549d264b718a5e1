mod common;

use campus_rbac::{codes, permissions, RbacConfig, RbacError, RbacSeeder, RoleName};
use common::{principal, Fixture};

#[tokio::test]
async fn test_seed_all_is_idempotent() {
    let fx = Fixture::new().await;
    let seeder = RbacSeeder::new(fx.db().clone(), RbacConfig::default());
    let catalogue = permissions::all_permissions().len();

    let first = seeder.seed_all(false).await.unwrap();
    // The fixture already created the catalogue
    assert_eq!(first.permissions_created, 0);
    assert_eq!(first.permissions_updated, catalogue);
    assert_eq!(first.roles_created, 8);
    assert_eq!(first.tenants_seeded, 1);
    assert_eq!(first.links_skipped, 0);
    assert!(first.links_created > 0);

    let roles = fx.test_db.count_records("roles").await.unwrap();
    let links = fx.test_db.count_records("role_permissions").await.unwrap();
    assert_eq!(links as usize, first.links_created);

    let second = seeder.seed_all(false).await.unwrap();
    assert_eq!(second.roles_created, 0);
    assert_eq!(second.roles_updated, 8);
    assert_eq!(second.links_created, 0);
    assert_eq!(fx.test_db.count_records("roles").await.unwrap(), roles);
    assert_eq!(fx.test_db.count_records("role_permissions").await.unwrap(), links);
    assert_eq!(
        fx.test_db.count_records("permissions").await.unwrap() as usize,
        catalogue
    );
}

#[tokio::test]
async fn test_seeded_matrix() {
    let fx = Fixture::new().await;
    RbacSeeder::new(fx.db().clone(), RbacConfig::default())
        .seed_all(false)
        .await
        .unwrap();
    let selectors = fx.service.selectors();
    let catalogue = permissions::all_permissions().len();

    let superadmin = selectors.role_by_name(None, RoleName::Superadmin).await.unwrap().unwrap();
    assert!(superadmin.is_system_role);
    assert!(superadmin.is_system_wide());
    assert_eq!(selectors.role_permissions(superadmin.id).await.unwrap().len(), catalogue);

    let principal_role = selectors
        .role_by_name(Some(fx.tenant.id), RoleName::Principal)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(selectors.role_permissions(principal_role.id).await.unwrap().len(), catalogue);

    let teacher = selectors
        .role_by_name(Some(fx.tenant.id), RoleName::Teacher)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(teacher.level_rank, 4);
    let teacher_codes: Vec<String> = selectors
        .role_permissions(teacher.id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.code)
        .collect();
    assert_eq!(teacher_codes.len(), 16);
    assert!(teacher_codes.contains(&codes::RESULT_ENTER.to_string()));
    assert!(!teacher_codes.contains(&codes::FEE_COLLECT.to_string()));

    let visible = selectors.tenant_roles(Some(fx.tenant.id), true).await.unwrap();
    assert_eq!(visible.len(), 8);
    assert_eq!(visible[0].name, RoleName::Superadmin);
    assert_eq!(selectors.tenant_roles(Some(fx.tenant.id), false).await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_force_reseed_restores_matrix() {
    let fx = Fixture::new().await;
    let seeder = RbacSeeder::new(fx.db().clone(), RbacConfig::default());
    seeder.seed_all(false).await.unwrap();

    let teacher = fx
        .service
        .selectors()
        .role_by_name(Some(fx.tenant.id), RoleName::Teacher)
        .await
        .unwrap()
        .unwrap();
    fx.service.grant_permission(teacher.id, codes::FEE_REFUND, None).await.unwrap();
    fx.service.revoke_permission(teacher.id, codes::RESULT_ENTER).await.unwrap();

    let user = fx.user("t@greenfield.test").await;
    fx.service.assign_role(user.id, &teacher, None, None, None).await.unwrap();
    let p = principal(&user);
    assert!(fx.service.user_has_permission(&p, codes::FEE_REFUND, None).await.unwrap());

    // Without force, links are only added
    seeder.seed_for_tenant(fx.tenant.id, false).await.unwrap();
    assert!(fx.service.user_has_permission(&p, codes::FEE_REFUND, None).await.unwrap());
    assert!(fx.service.user_has_permission(&p, codes::RESULT_ENTER, None).await.unwrap());

    let report = seeder.seed_for_tenant(fx.tenant.id, true).await.unwrap();
    assert!(report.links_removed > 0);
    assert!(!fx.service.user_has_permission(&p, codes::FEE_REFUND, None).await.unwrap());
    assert!(fx.service.user_has_permission(&p, codes::RESULT_ENTER, None).await.unwrap());
}

#[tokio::test]
async fn test_seed_unknown_tenant_fails() {
    let fx = Fixture::new().await;
    let err = RbacSeeder::new(fx.db().clone(), RbacConfig::default())
        .seed_for_tenant(404, false)
        .await
        .unwrap_err();

    assert!(matches!(err, RbacError::TenantNotFound { .. }));
    assert_eq!(fx.test_db.count_records("roles").await.unwrap(), 0);
}

#[tokio::test]
async fn test_permission_matrix_groups_by_category() {
    let fx = Fixture::new().await;
    let matrix = fx.service.selectors().permission_matrix().await.unwrap();

    let finance: Vec<&str> = matrix["finance"].iter().map(|p| p.code.as_str()).collect();
    assert!(finance.contains(&codes::FEE_COLLECT));
    assert!(finance.contains(&codes::SALARY_APPROVE));
    assert!(matrix["attendance"].iter().any(|p| p.code == codes::STAFF_ATTENDANCE_MARK));

    let total: usize = matrix.values().map(Vec::len).sum();
    assert_eq!(total, permissions::all_permissions().len());
}
