//! Wire shapes for the EDI integration gateway
//!
//! Membership records arrive from the legacy slader lookup; link requests go
//! out to the cover-linking endpoint. Neither shape is persisted locally, so
//! the serde renames below are the upstream contract, not ours.

use serde::{Deserialize, Serialize};

/// One externally-held cover membership, as reported by the slader lookup.
///
/// The payer slade code arrives as numeric text and is only converted when a
/// link request is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Phone number the membership was found under
    #[serde(rename = "phone")]
    pub phone_number: String,
    /// Payer organization identifier, numeric text (e.g. "1001")
    #[serde(rename = "payerSladeCode")]
    pub payer_slade_code: String,
    /// Member identifier within the payer's scheme
    #[serde(rename = "memberNumber")]
    pub member_number: String,
}

/// Payload for the cover-linking endpoint.
///
/// Built per attempt from a membership record plus the user's identity;
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRequest {
    #[serde(rename = "payerSladeCode")]
    pub payer_slade_code: i64,
    #[serde(rename = "memberNumber")]
    pub member_number: String,
    pub uid: String,
    /// The upstream contract keys the token array with a singular name.
    #[serde(rename = "pushToken")]
    pub push_tokens: Vec<String>,
}

/// Captured response from a cover-linking call.
///
/// The body is read eagerly so classification and callers can both see it
/// without re-reading the network stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkResponse {
    pub status: u16,
    pub body: String,
}

/// Classification of a link attempt's upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Upstream accepted the link (status 200)
    Linked,
    /// Upstream reported the cover is already attached to this profile
    AlreadyLinked,
    /// Upstream rejected the attempt with a distinct error message
    Failed { message: String },
}
