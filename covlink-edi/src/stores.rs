//! Persistence seams for reconciliation
//!
//! The reconciler is constructed against these traits so the profile store,
//! audit log and review queue can be swapped without touching orchestration
//! logic.

use async_trait::async_trait;
use covlink_common::Result;
use uuid::Uuid;

use crate::models::{AuditEvent, Profile, ReviewTicket};

/// Read side of the profile service's store.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Look up a profile by phone number.
    ///
    /// `include_suspended` widens the match to suspended profiles; the
    /// reconciliation paths always pass `false`.
    async fn get_profile_by_phone_number(
        &self,
        phone_number: &str,
        include_suspended: bool,
    ) -> Result<Option<Profile>>;
}

/// Append-only store for cover auto-linking audit events.
#[async_trait]
pub trait CoverEventStore: Send + Sync {
    /// Append one event and return its id.
    async fn save_cover_autolinking_event(&self, event: &AuditEvent) -> Result<Uuid>;
}

/// Queue of tickets awaiting the manual-review workflow.
#[async_trait]
pub trait ReviewQueue: Send + Sync {
    /// File a ticket. No dedup is attempted here; see the reconciler notes.
    async fn save_cover_linking_notification(&self, ticket: &ReviewTicket) -> Result<()>;

    /// Number of tickets still pending review.
    async fn pending_count(&self) -> Result<i64>;
}
