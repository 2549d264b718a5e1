//! Tenants, branches, users and seeding

use anyhow::{Context, Result};
use campus_rbac::{NewUser, RoleName, SeedReport};

use super::AppContext;

pub async fn seed(ctx: &AppContext, tenant_id: Option<i32>, force: bool) -> Result<SeedReport> {
    let report = match tenant_id {
        Some(tenant_id) => {
            let mut report = ctx.seeder.create_permissions().await?;
            report.merge(ctx.seeder.create_system_roles().await?);
            report.merge(
                ctx.seeder
                    .seed_for_tenant(tenant_id, force)
                    .await
                    .with_context(|| format!("Failed to seed tenant {}", tenant_id))?,
            );
            report
        }
        None => ctx.seeder.seed_all(force).await?,
    };

    println!("✅ Seeding complete");
    println!(
        "   Permissions: {} created, {} updated",
        report.permissions_created, report.permissions_updated
    );
    println!("   Roles: {} created, {} updated", report.roles_created, report.roles_updated);
    println!(
        "   Links: {} created, {} removed, {} skipped",
        report.links_created, report.links_removed, report.links_skipped
    );
    println!("   Tenants seeded: {}", report.tenants_seeded);
    Ok(report)
}

pub async fn create_tenant(ctx: &AppContext, name: &str, display_name: &str) -> Result<()> {
    let tenant = ctx.manager.create_tenant(name, display_name).await?;
    println!("✅ Created tenant {} ({}) with id {}", tenant.name, tenant.display_name, tenant.id);
    Ok(())
}

pub async fn list_tenants(ctx: &AppContext, include_inactive: bool) -> Result<()> {
    let tenants = ctx.manager.list_tenants(!include_inactive).await?;
    if tenants.is_empty() {
        println!("No tenants found");
        return Ok(());
    }

    println!("{:<6} {:<24} {:<32} {}", "ID", "NAME", "DISPLAY NAME", "ACTIVE");
    for tenant in tenants {
        println!(
            "{:<6} {:<24} {:<32} {}",
            tenant.id, tenant.name, tenant.display_name, tenant.is_active
        );
    }
    Ok(())
}

pub async fn create_branch(ctx: &AppContext, tenant_id: i32, name: &str, code: Option<&str>) -> Result<()> {
    let branch = ctx.manager.create_branch(tenant_id, name, code).await?;
    println!("✅ Created branch {} with id {} in tenant {}", branch.name, branch.id, tenant_id);
    Ok(())
}

pub async fn list_branches(ctx: &AppContext, tenant_id: i32) -> Result<()> {
    let branches = ctx.manager.list_branches(tenant_id).await?;
    if branches.is_empty() {
        println!("No branches in tenant {}", tenant_id);
        return Ok(());
    }

    println!("{:<6} {:<32} {:<10} {}", "ID", "NAME", "CODE", "ACTIVE");
    for branch in branches {
        println!(
            "{:<6} {:<32} {:<10} {}",
            branch.id,
            branch.name,
            branch.code.as_deref().unwrap_or("-"),
            branch.is_active
        );
    }
    Ok(())
}

pub async fn create_user(
    ctx: &AppContext,
    email: &str,
    display_name: Option<String>,
    user_type: Option<RoleName>,
    tenant_id: Option<i32>,
    superuser: bool,
) -> Result<()> {
    let mut new_user = NewUser::new(email);
    new_user.display_name = display_name;
    if let Some(tenant_id) = tenant_id {
        new_user = new_user.in_tenant(tenant_id);
    }
    if let Some(user_type) = user_type {
        new_user = new_user.with_type(user_type);
    }
    if superuser {
        new_user = new_user.superuser();
    }

    let user = ctx.manager.create_user(new_user).await?;
    println!("✅ Created user {} with id {}", user.email, user.id);

    for held in ctx.service.get_user_roles(user.id, None, true).await? {
        println!("   Default role: {}", held.role.name.label());
    }
    Ok(())
}
