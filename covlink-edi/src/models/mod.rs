//! Data models for covlink-edi (cover auto-linking reconciliation)

pub mod cover;
pub mod profile;
pub mod records;

pub use cover::{LinkOutcome, LinkRequest, LinkResponse, MembershipRecord};
pub use profile::Profile;
pub use records::{AuditEvent, ReviewTicket, TicketState, COVERLINKING_COMPLETED};
