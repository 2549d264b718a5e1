//! Query conditions shared by every assignment lookup

use campus_storage::seaorm::entities::user_roles;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, Condition};

/// `is_active AND valid_from <= now AND (valid_until IS NULL OR valid_until >= now)`
pub fn currently_valid(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(user_roles::Column::IsActive.eq(true))
        .add(user_roles::Column::ValidFrom.lte(now))
        .add(
            Condition::any()
                .add(user_roles::Column::ValidUntil.is_null())
                .add(user_roles::Column::ValidUntil.gte(now)),
        )
}

/// `branch_id = branch OR branch_id IS NULL`
pub fn applicable_to_branch(branch_id: i32) -> Condition {
    Condition::any()
        .add(user_roles::Column::BranchId.eq(branch_id))
        .add(user_roles::Column::BranchId.is_null())
}

/// Combined filter for a user's assignments, optionally branch scoped
pub fn valid_for(user_id: i32, branch_id: Option<i32>, now: DateTime<Utc>) -> Condition {
    let mut condition = Condition::all()
        .add(user_roles::Column::UserId.eq(user_id))
        .add(currently_valid(now));
    if let Some(branch_id) = branch_id {
        condition = condition.add(applicable_to_branch(branch_id));
    }
    condition
}
