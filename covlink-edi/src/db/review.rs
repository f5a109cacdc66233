//! Review ticket queue persistence

use async_trait::async_trait;
use covlink_common::Result;
use sqlx::SqlitePool;

use crate::models::{ReviewTicket, TicketState};
use crate::stores::ReviewQueue;

/// Sqlx-backed review ticket queue
#[derive(Debug, Clone)]
pub struct SqlReviewQueue {
    pool: SqlitePool,
}

impl SqlReviewQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewQueue for SqlReviewQueue {
    async fn save_cover_linking_notification(&self, ticket: &ReviewTicket) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO review_tickets (
                id, timestamp, is_read, payer_slade_code, member_number,
                state, first_name, last_name, phone_number, error_message
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(ticket.id.to_string())
        .bind(ticket.timestamp.to_rfc3339())
        .bind(ticket.read)
        .bind(ticket.payer_slade_code)
        .bind(&ticket.member_number)
        .bind(ticket.state.as_str())
        .bind(&ticket.first_name)
        .bind(&ticket.last_name)
        .bind(&ticket.phone_number)
        .bind(&ticket.error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn pending_count(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM review_tickets WHERE state = ?")
                .bind(TicketState::Pending.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
