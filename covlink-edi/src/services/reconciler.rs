//! Cover auto-linking reconciliation
//!
//! Orchestrates the path from "a phone number might have covers" to a
//! recorded outcome: slader lookup, link request build, outbound link call,
//! outcome classification, then audit and review bookkeeping.

use std::sync::Arc;

use thiserror::Error;

use covlink_common::Error as CommonError;

use crate::models::{
    AuditEvent, LinkOutcome, LinkRequest, LinkResponse, MembershipRecord, ReviewTicket,
};
use crate::services::edi_client::{EdiClient, EdiError};
use crate::stores::{CoverEventStore, ProfileRepository, ReviewQueue};

/// Substring the gateway uses to flag an idempotent duplicate link attempt.
pub const COVER_ALREADY_EXISTS: &str = "cover already exists";

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum LinkError {
    /// EDI gateway failure: transport, lookup status or lookup decode
    #[error(transparent)]
    Edi(#[from] EdiError),

    /// Non-200 link response whose body carried no readable error message
    #[error("Decode error: {0}")]
    Decode(String),

    /// Membership record carried a payer slade code that is not numeric text
    #[error("failed to convert slade code to an int: {value}")]
    InvalidSladeCode { value: String },

    /// No active profile is registered under the phone number
    #[error("No profile found for phone number {phone}")]
    ProfileNotFound { phone: String },

    /// Audit, review or profile persistence failed
    #[error(transparent)]
    Store(#[from] CommonError),
}

/// Build the cover-link payload from a membership record and user identity.
///
/// The payer slade code is numeric text on the wire; conversion failure
/// aborts the attempt before any network call, so a bad record has no side
/// effects at all.
pub fn build_link_request(
    record: &MembershipRecord,
    uid: &str,
    push_tokens: &[String],
) -> Result<LinkRequest, LinkError> {
    let payer_slade_code: i64 =
        record
            .payer_slade_code
            .parse()
            .map_err(|_| LinkError::InvalidSladeCode {
                value: record.payer_slade_code.clone(),
            })?;

    Ok(LinkRequest {
        payer_slade_code,
        member_number: record.member_number.clone(),
        uid: uid.to_string(),
        push_tokens: push_tokens.to_vec(),
    })
}

/// Classify a link attempt's captured upstream response.
///
/// Status 200 is a completed link. Any other status must carry a JSON body
/// with a string `error` field; a message containing the duplicate marker is
/// the idempotent already-linked case, anything else is an unrecoverable
/// rejection.
pub fn classify_outcome(response: &LinkResponse) -> Result<LinkOutcome, LinkError> {
    if response.status == 200 {
        return Ok(LinkOutcome::Linked);
    }

    let body: serde_json::Value = serde_json::from_str(&response.body)
        .map_err(|e| LinkError::Decode(format!("Unreadable link response body: {}", e)))?;

    let message = body.get("error").and_then(|v| v.as_str()).ok_or_else(|| {
        LinkError::Decode(format!(
            "Link response (status {}) has no error message",
            response.status
        ))
    })?;

    if message.contains(COVER_ALREADY_EXISTS) {
        Ok(LinkOutcome::AlreadyLinked)
    } else {
        Ok(LinkOutcome::Failed {
            message: message.to_string(),
        })
    }
}

/// Orchestrates cover auto-linking against the EDI gateway and records
/// reconciliation outcomes.
///
/// Stateless between calls; collaborators are injected so call sites and
/// tests choose the backing stores.
pub struct CoverReconciler {
    edi: EdiClient,
    profiles: Arc<dyn ProfileRepository>,
    events: Arc<dyn CoverEventStore>,
    review: Arc<dyn ReviewQueue>,
}

impl CoverReconciler {
    pub fn new(
        edi: EdiClient,
        profiles: Arc<dyn ProfileRepository>,
        events: Arc<dyn CoverEventStore>,
        review: Arc<dyn ReviewQueue>,
    ) -> Self {
        Self {
            edi,
            profiles,
            events,
            review,
        }
    }

    /// Discover and link whichever cover the legacy source holds for a
    /// phone number.
    ///
    /// Returns the captured link response, or `None` when the lookup found
    /// no memberships (no call was made). Errors are reserved for
    /// transport, decode, slade-code and store failures; an upstream
    /// rejection is not an error here, it is recorded as a review ticket.
    pub async fn link_cover(
        &self,
        phone_number: &str,
        uid: &str,
        push_tokens: &[String],
    ) -> Result<Option<LinkResponse>, LinkError> {
        let records = self.edi.fetch_member_covers(phone_number).await?;

        // Only the first membership is attempted. Covers past the first are
        // dropped for users with multiple memberships; kept as-is until the
        // admin workflow can absorb a batch of link outcomes per user.
        let record = match records.first() {
            Some(record) => record,
            None => {
                tracing::info!(phone_number = phone_number, "No cover memberships found");
                return Ok(None);
            }
        };

        let request = build_link_request(record, uid, push_tokens)?;
        let response = self.edi.link_cover(&request).await?;

        match classify_outcome(&response)? {
            LinkOutcome::Linked => {
                tracing::info!(
                    phone_number = phone_number,
                    member_number = %record.member_number,
                    "Cover linked"
                );
            }
            LinkOutcome::AlreadyLinked => {
                // Idempotent duplicate: absorbed, never ticketed.
                tracing::info!(
                    phone_number = phone_number,
                    member_number = %record.member_number,
                    "Cover already linked, nothing to do"
                );
            }
            LinkOutcome::Failed { message } => {
                tracing::warn!(
                    phone_number = phone_number,
                    member_number = %record.member_number,
                    error = %message,
                    "Cover link rejected, queueing for manual review"
                );
                self.create_cover_linking_request(
                    phone_number,
                    &record.member_number,
                    request.payer_slade_code,
                    &message,
                )
                .await?;
            }
        }

        // Appended on every classified path, including a rejection that just
        // queued a ticket: the log says "coverlinking completed" for attempts
        // that did not complete. That overcount matches the contract the
        // admin tooling was built against; see DESIGN.md before changing it.
        let event = AuditEvent::completed(&record.member_number, phone_number);
        self.events.save_cover_autolinking_event(&event).await?;

        Ok(Some(response))
    }

    /// Link a cover whose member number and payer are already known.
    ///
    /// The profile store supplies the UID and push tokens; the call fails if
    /// no active profile matches the phone number. Classification and the
    /// review-ticket rule are identical to `link_cover`, but no audit event
    /// is written on any path here. Only `link_cover` appends to the audit
    /// log.
    pub async fn link_edi_member_cover(
        &self,
        phone_number: &str,
        member_number: &str,
        payer_slade_code: i64,
    ) -> Result<LinkResponse, LinkError> {
        let profile = self
            .profiles
            .get_profile_by_phone_number(phone_number, false)
            .await?
            .ok_or_else(|| LinkError::ProfileNotFound {
                phone: phone_number.to_string(),
            })?;

        let request = LinkRequest {
            payer_slade_code,
            member_number: member_number.to_string(),
            uid: profile.uid.clone(),
            push_tokens: profile.push_tokens.clone(),
        };

        let response = self.edi.link_cover(&request).await?;

        match classify_outcome(&response)? {
            LinkOutcome::Linked => {
                tracing::info!(
                    phone_number = phone_number,
                    member_number = member_number,
                    "Member cover linked"
                );
            }
            LinkOutcome::AlreadyLinked => {
                tracing::info!(
                    phone_number = phone_number,
                    member_number = member_number,
                    "Member cover already linked, nothing to do"
                );
            }
            LinkOutcome::Failed { message } => {
                tracing::warn!(
                    phone_number = phone_number,
                    member_number = member_number,
                    error = %message,
                    "Member cover link rejected, queueing for manual review"
                );
                self.create_cover_linking_request(
                    phone_number,
                    member_number,
                    payer_slade_code,
                    &message,
                )
                .await?;
            }
        }

        Ok(response)
    }

    /// File a manual-review ticket for a link attempt upstream rejected.
    ///
    /// Fetches the profile for the reviewer-facing name fields, then
    /// persists a fresh unread Pending ticket carrying the upstream error
    /// message. No dedup: two racing failures for the same membership file
    /// two tickets, and the review workflow tolerates that.
    pub async fn create_cover_linking_request(
        &self,
        phone_number: &str,
        member_number: &str,
        payer_slade_code: i64,
        error_message: &str,
    ) -> Result<ReviewTicket, LinkError> {
        let profile = self
            .profiles
            .get_profile_by_phone_number(phone_number, false)
            .await?
            .ok_or_else(|| LinkError::ProfileNotFound {
                phone: phone_number.to_string(),
            })?;

        let ticket = ReviewTicket::pending(
            payer_slade_code,
            member_number,
            &profile.first_name,
            &profile.last_name,
            phone_number,
            error_message,
        );

        self.review.save_cover_linking_notification(&ticket).await?;

        tracing::info!(
            ticket_id = %ticket.id,
            phone_number = phone_number,
            member_number = member_number,
            "Review ticket filed"
        );

        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(slade: &str) -> MembershipRecord {
        MembershipRecord {
            phone_number: "+254700000001".to_string(),
            payer_slade_code: slade.to_string(),
            member_number: "MEM-1".to_string(),
        }
    }

    #[test]
    fn test_build_request_converts_numeric_slade_code() {
        let tokens = vec!["tok-a".to_string(), "tok-b".to_string()];
        let request = build_link_request(&record("1001"), "user-1", &tokens).unwrap();

        assert_eq!(request.payer_slade_code, 1001);
        assert_eq!(request.member_number, "MEM-1");
        assert_eq!(request.uid, "user-1");
        assert_eq!(request.push_tokens, tokens);
    }

    #[test]
    fn test_build_request_rejects_non_numeric_slade_code() {
        let err = build_link_request(&record("12A4"), "user-1", &[]).unwrap_err();

        assert!(matches!(err, LinkError::InvalidSladeCode { .. }));
        assert!(err
            .to_string()
            .contains("failed to convert slade code to an int"));
        assert!(err.to_string().contains("12A4"));
    }

    #[test]
    fn test_build_request_rejects_padded_slade_code() {
        // The conversion is strict: no trimming of upstream whitespace.
        let err = build_link_request(&record(" 1001"), "user-1", &[]).unwrap_err();
        assert!(matches!(err, LinkError::InvalidSladeCode { .. }));
    }

    #[test]
    fn test_status_200_classifies_as_linked() {
        let response = LinkResponse {
            status: 200,
            body: "{}".to_string(),
        };
        assert_eq!(classify_outcome(&response).unwrap(), LinkOutcome::Linked);
    }

    #[test]
    fn test_duplicate_marker_classifies_as_already_linked() {
        let response = LinkResponse {
            status: 400,
            body: r#"{"error":"cover already exists for member MEM-1"}"#.to_string(),
        };
        assert_eq!(
            classify_outcome(&response).unwrap(),
            LinkOutcome::AlreadyLinked
        );
    }

    #[test]
    fn test_other_error_message_classifies_as_failed() {
        let response = LinkResponse {
            status: 422,
            body: r#"{"error":"payer not recognized"}"#.to_string(),
        };
        assert_eq!(
            classify_outcome(&response).unwrap(),
            LinkOutcome::Failed {
                message: "payer not recognized".to_string()
            }
        );
    }

    #[test]
    fn test_unparseable_body_is_a_decode_error() {
        let response = LinkResponse {
            status: 500,
            body: "<html>gateway timeout</html>".to_string(),
        };
        assert!(matches!(
            classify_outcome(&response).unwrap_err(),
            LinkError::Decode(_)
        ));
    }

    #[test]
    fn test_missing_error_field_is_a_decode_error() {
        let response = LinkResponse {
            status: 500,
            body: r#"{"detail":"wrong shape"}"#.to_string(),
        };
        assert!(matches!(
            classify_outcome(&response).unwrap_err(),
            LinkError::Decode(_)
        ));
    }

    #[test]
    fn test_non_string_error_field_is_a_decode_error() {
        let response = LinkResponse {
            status: 500,
            body: r#"{"error":{"code":7}}"#.to_string(),
        };
        assert!(matches!(
            classify_outcome(&response).unwrap_err(),
            LinkError::Decode(_)
        ));
    }

    #[test]
    fn test_slade_code_error_renders_legacy_message() {
        let err = LinkError::InvalidSladeCode {
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to convert slade code to an int: abc"
        );
    }
}
