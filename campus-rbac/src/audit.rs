//! Audit trail for permission checks and role changes
//!
//! Writing the trail is best effort. [`record_quietly`] is the only way the
//! service talks to a sink, and it never lets a sink error escape.

use async_trait::async_trait;
use campus_storage::seaorm::entities::{permission_audit_logs, PermissionAuditLogs};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use std::sync::Arc;
use tracing::warn;

use crate::{error::RbacResult, models::AuditEntry};

/// Destination for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> RbacResult<()>;
}

/// Appends entries to `permission_audit_logs`
#[derive(Clone)]
pub struct DatabaseAuditSink {
    db: DatabaseConnection,
}

impl DatabaseAuditSink {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditSink for DatabaseAuditSink {
    async fn record(&self, entry: AuditEntry) -> RbacResult<()> {
        let model = permission_audit_logs::ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            permission_code: Set(entry.permission_code),
            resource_type: Set(entry.resource_type),
            resource_id: Set(entry.resource_id),
            granted: Set(entry.granted),
            reason: Set(entry.reason),
            ip_address: Set(entry.ip_address),
            path: Set(entry.path),
            timestamp: Set(entry.timestamp),
            ..Default::default()
        };
        model.insert(&self.db).await?;
        Ok(())
    }
}

/// Discards every entry
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

#[async_trait]
impl AuditSink for NoopAuditSink {
    async fn record(&self, _entry: AuditEntry) -> RbacResult<()> {
        Ok(())
    }
}

/// Record an entry, logging and dropping any failure
pub async fn record_quietly(sink: &Arc<dyn AuditSink>, entry: AuditEntry) {
    let code = entry.permission_code.clone();
    if let Err(e) = sink.record(entry).await {
        warn!(permission = %code, error = %e, "Failed to write audit entry");
    }
}

/// Most recent entries first, optionally for one user
pub async fn recent_entries(
    db: &DatabaseConnection,
    user_id: Option<i32>,
    limit: u64,
) -> RbacResult<Vec<AuditEntry>> {
    let mut query = PermissionAuditLogs::find();
    if let Some(user_id) = user_id {
        query = query.filter(permission_audit_logs::Column::UserId.eq(user_id));
    }

    let rows = query
        .order_by_desc(permission_audit_logs::Column::Timestamp)
        .order_by_desc(permission_audit_logs::Column::Id)
        .limit(limit)
        .all(db)
        .await?;

    Ok(rows.into_iter().map(AuditEntry::from).collect())
}
