//! Persisted reconciliation records: audit events and review tickets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status literal stamped on every audit event appended by `link_cover`.
pub const COVERLINKING_COMPLETED: &str = "coverlinking completed";

/// Append-only audit log entry recording that a linking attempt ran to a
/// classified outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Always `COVERLINKING_COMPLETED`; the log does not distinguish outcomes
    pub status: String,
    pub member_number: String,
    pub phone_number: String,
}

impl AuditEvent {
    /// New completed-attempt event for the given member and phone number.
    pub fn completed(member_number: &str, phone_number: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            status: COVERLINKING_COMPLETED.to_string(),
            member_number: member_number.to_string(),
            phone_number: phone_number.to_string(),
        }
    }
}

/// Review workflow state of a ticket.
///
/// Reconciliation only ever files `Pending` tickets; the admin workflow
/// owns the transition to `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TicketState {
    Pending,
    Resolved,
}

impl TicketState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketState::Pending => "PENDING",
            TicketState::Resolved => "RESOLVED",
        }
    }
}

/// A manual-review ticket, filed when automatic linking was rejected
/// upstream and the rejection was not an idempotent duplicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewTicket {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Whether an admin has opened the ticket
    pub read: bool,
    pub payer_slade_code: i64,
    pub member_number: String,
    pub state: TicketState,
    /// Name fields copied from the profile so reviewers see who is affected
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    /// Error message extracted from the upstream rejection
    pub error_message: String,
}

impl ReviewTicket {
    /// New unread, pending ticket for a rejected link attempt.
    pub fn pending(
        payer_slade_code: i64,
        member_number: &str,
        first_name: &str,
        last_name: &str,
        phone_number: &str,
        error_message: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            read: false,
            payer_slade_code,
            member_number: member_number.to_string(),
            state: TicketState::Pending,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone_number: phone_number.to_string(),
            error_message: error_message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_event_carries_fixed_status() {
        let event = AuditEvent::completed("MEM-1", "+254700000001");
        assert_eq!(event.status, COVERLINKING_COMPLETED);
        assert_eq!(event.member_number, "MEM-1");
        assert_eq!(event.phone_number, "+254700000001");
    }

    #[test]
    fn test_pending_ticket_starts_unread() {
        let ticket = ReviewTicket::pending(1001, "MEM-1", "Ada", "W", "+254700000001", "boom");
        assert!(!ticket.read);
        assert_eq!(ticket.state, TicketState::Pending);
        assert_eq!(ticket.error_message, "boom");
    }

    #[test]
    fn test_ticket_ids_are_unique() {
        let a = ReviewTicket::pending(1, "M", "A", "B", "p", "e");
        let b = ReviewTicket::pending(1, "M", "A", "B", "p", "e");
        assert_ne!(a.id, b.id);
    }
}
