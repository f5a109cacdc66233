//! User profile model

use serde::{Deserialize, Serialize};

/// A user profile row as maintained by the profile service.
///
/// Reconciliation only reads profiles: the UID and push tokens feed link
/// requests, the name fields label review tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Stable user identifier assigned at registration
    pub uid: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    /// Device push notification tokens, most recent last
    #[serde(default)]
    pub push_tokens: Vec<String>,
    /// Suspended profiles are excluded from lookups unless asked for
    #[serde(default)]
    pub suspended: bool,
}
