//! Permission checks, role assignments and reporting

use anyhow::{Context, Result};
use campus_rbac::{permissions, Principal, RoleName, UserRole};
use chrono::{Duration, Utc};
use tracing::warn;

use super::AppContext;

async fn actor(ctx: &AppContext, by: Option<i32>) -> Result<Option<Principal>> {
    match by {
        Some(user_id) => {
            let principal = ctx
                .service
                .load_principal(user_id)
                .await
                .with_context(|| format!("Cannot act as user {}", user_id))?;
            Ok(Some(principal))
        }
        None => Ok(None),
    }
}

pub async fn check(ctx: &AppContext, user_id: i32, permission: &str, branch_id: Option<i32>) -> Result<bool> {
    if !permissions::is_registered(permission) {
        warn!(permission, "Permission code is not in the catalogue");
    }

    let principal = ctx.service.load_principal(user_id).await?;
    let granted = ctx.service.user_has_permission(&principal, permission, branch_id).await?;

    let scope = branch_id.map_or_else(|| "any branch".to_string(), |id| format!("branch {}", id));
    if granted {
        println!("✅ {} has {} in {}", principal.label(), permission, scope);
    } else {
        println!("❌ {} lacks {} in {}", principal.label(), permission, scope);
    }
    Ok(granted)
}

pub async fn assign(
    ctx: &AppContext,
    user_id: i32,
    role: RoleName,
    tenant_id: Option<i32>,
    branch_id: Option<i32>,
    by: Option<i32>,
    valid_days: Option<u32>,
) -> Result<UserRole> {
    let tenant_id = match tenant_id {
        Some(tenant_id) => Some(tenant_id),
        None => ctx.manager.get_user(user_id).await?.and_then(|user| user.tenant_id),
    };
    let actor = actor(ctx, by).await?;
    let valid_until = valid_days.map(|days| Utc::now() + Duration::days(i64::from(days)));

    let assignment = ctx
        .service
        .assign_role_by_name(user_id, tenant_id, role, branch_id, actor.as_ref(), valid_until)
        .await?;

    println!(
        "✅ Assigned {} to user {} (assignment {})",
        role.label(),
        user_id,
        assignment.id
    );
    if let Some(until) = assignment.valid_until {
        println!("   Valid until {}", until.to_rfc3339());
    }
    Ok(assignment)
}

pub async fn revoke(ctx: &AppContext, assignment_id: i32, by: Option<i32>) -> Result<()> {
    let actor = actor(ctx, by).await?;
    let revoked = ctx.service.revoke_assignment(assignment_id, actor.as_ref()).await?;
    println!("✅ Revoked assignment {} of user {}", revoked.id, revoked.user_id);
    Ok(())
}

pub async fn roles(ctx: &AppContext, tenant_id: Option<i32>, user_id: Option<i32>, all: bool) -> Result<()> {
    if let Some(user_id) = user_id {
        let held = ctx.service.get_user_roles(user_id, None, !all).await?;
        if held.is_empty() {
            println!("User {} holds no roles", user_id);
            return Ok(());
        }

        println!("{:<6} {:<14} {:<10} {:<26} {}", "ID", "ROLE", "BRANCH", "VALID UNTIL", "ACTIVE");
        for entry in held {
            let assignment = entry.assignment;
            println!(
                "{:<6} {:<14} {:<10} {:<26} {}",
                assignment.id,
                entry.role.name.as_str(),
                assignment.branch_id.map_or_else(|| "all".to_string(), |id| id.to_string()),
                assignment
                    .valid_until
                    .map_or_else(|| "-".to_string(), |until| until.to_rfc3339()),
                assignment.is_valid()
            );
        }
        return Ok(());
    }

    let roles = ctx.service.selectors().tenant_roles(tenant_id, true).await?;
    println!("{:<6} {:<14} {:<20} {:<6} {}", "ID", "NAME", "DISPLAY NAME", "RANK", "SCOPE");
    for role in roles {
        let scope = if role.is_system_wide() { "system" } else { "tenant" };
        println!(
            "{:<6} {:<14} {:<20} {:<6} {}",
            role.id,
            role.name.as_str(),
            role.display_name,
            role.level_rank,
            scope
        );
    }
    Ok(())
}

pub async fn list_permissions(ctx: &AppContext, category: Option<&str>) -> Result<()> {
    let selectors = ctx.service.selectors();
    let permissions = match category {
        Some(category) => selectors.permissions_by_category(category).await?,
        None => selectors.all_permissions().await?,
    };

    if permissions.is_empty() {
        println!("No permissions found, run `campus seed` first");
        return Ok(());
    }

    for permission in permissions {
        let marker = if permission.is_active { " " } else { "x" };
        println!(
            "{} {:<28} {:<14} {}",
            marker, permission.code, permission.category, permission.description
        );
    }
    Ok(())
}

pub async fn summary(ctx: &AppContext, branch_id: i32) -> Result<()> {
    let branch = ctx.service.selectors().branch(branch_id).await?;
    let counts = ctx.service.selectors().role_summary_for_branch(branch_id).await?;

    println!("Role holders in {} (branch {})", branch.name, branch.id);
    if counts.is_empty() {
        println!("   none");
    }
    for (role, count) in counts {
        println!("   {:<20} {}", role.label(), count);
    }
    Ok(())
}

pub async fn audit(ctx: &AppContext, user_id: Option<i32>, limit: Option<u64>) -> Result<()> {
    let limit = limit.unwrap_or(ctx.audit_page_size);
    let entries = ctx.service.recent_audit_entries(user_id, limit).await?;

    for entry in entries {
        println!(
            "{} {:<6} {:<6} {:<24} {:<5} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.user_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
            entry.permission_code,
            if entry.granted { "yes" } else { "no" },
            entry.reason
        );
    }
    Ok(())
}
