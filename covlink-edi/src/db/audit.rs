//! Cover audit event persistence

use async_trait::async_trait;
use covlink_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::AuditEvent;
use crate::stores::CoverEventStore;

/// Sqlx-backed append-only audit event store
#[derive(Debug, Clone)]
pub struct SqlCoverEventStore {
    pool: SqlitePool,
}

impl SqlCoverEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CoverEventStore for SqlCoverEventStore {
    async fn save_cover_autolinking_event(&self, event: &AuditEvent) -> Result<Uuid> {
        sqlx::query(
            r#"
            INSERT INTO cover_audit_events (id, timestamp, status, member_number, phone_number)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.id.to_string())
        .bind(event.timestamp.to_rfc3339())
        .bind(&event.status)
        .bind(&event.member_number)
        .bind(&event.phone_number)
        .execute(&self.pool)
        .await?;

        Ok(event.id)
    }
}
