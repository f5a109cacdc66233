//! EDI integration gateway client
//!
//! Two endpoints matter to this service: the slader membership lookup and
//! the cover-linking call. Both are internal routes on the gateway.

use std::time::Duration;

use thiserror::Error;

use crate::models::{LinkRequest, LinkResponse, MembershipRecord};

/// Membership lookup path, relative to the gateway base URL
const SLADER_DATA_PATH: &str = "internal/slader_data";

/// Cover-linking path, relative to the gateway base URL
const LINK_COVER_PATH: &str = "internal/link_cover";

/// User agent for gateway requests
const USER_AGENT: &str = "covlink-edi/0.1.0";

/// EDI gateway client errors
#[derive(Debug, Error)]
pub enum EdiError {
    /// The call could not be made or its body could not be read
    #[error("Transport error: {0}")]
    Transport(String),

    /// The membership lookup answered with a non-200 status
    #[error("Upstream status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    /// A response body did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),
}

/// HTTP client for the EDI integration gateway
#[derive(Debug, Clone)]
pub struct EdiClient {
    client: reqwest::Client,
    base_url: String,
}

impl EdiClient {
    /// Create a client against the given gateway base URL.
    ///
    /// The timeout bounds every outbound call; a timed-out call surfaces as
    /// `EdiError::Transport`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, EdiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| EdiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the cover memberships the legacy source holds for a phone number.
    ///
    /// An empty list is a normal answer (the number has no covers), not an
    /// error. The phone number is sent as a query parameter and URL-encoded
    /// by the client, so `+254...` survives the trip.
    pub async fn fetch_member_covers(
        &self,
        phone_number: &str,
    ) -> Result<Vec<MembershipRecord>, EdiError> {
        let url = format!("{}/{}", self.base_url, SLADER_DATA_PATH);

        tracing::debug!(phone_number = phone_number, "Querying slader membership data");

        let response = self
            .client
            .get(&url)
            .query(&[("phoneNumber", phone_number)])
            .send()
            .await
            .map_err(|e| EdiError::Transport(format!("Slader lookup request failed: {}", e)))?;

        let status = response.status();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(EdiError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let records: Vec<MembershipRecord> = response
            .json()
            .await
            .map_err(|e| EdiError::Decode(format!("Invalid slader lookup response: {}", e)))?;

        tracing::debug!(
            phone_number = phone_number,
            count = records.len(),
            "Slader lookup complete"
        );

        Ok(records)
    }

    /// Post a cover-link request and capture the response as-is.
    ///
    /// Non-200 answers are NOT errors here: the reconciler classifies them.
    /// Only a failure to obtain any response at all is an `EdiError`.
    pub async fn link_cover(&self, request: &LinkRequest) -> Result<LinkResponse, EdiError> {
        let url = format!("{}/{}", self.base_url, LINK_COVER_PATH);

        tracing::debug!(
            member_number = %request.member_number,
            payer_slade_code = request.payer_slade_code,
            "Posting cover link request"
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| EdiError::Transport(format!("Link cover request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| EdiError::Transport(format!("Failed to read link response: {}", e)))?;

        Ok(LinkResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_stripped() {
        let client = EdiClient::new("http://localhost:8702/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url, "http://localhost:8702");
    }

    #[test]
    fn test_link_request_serializes_with_upstream_keys() {
        let request = LinkRequest {
            payer_slade_code: 1001,
            member_number: "MEM-1".to_string(),
            uid: "user-1".to_string(),
            push_tokens: vec!["tok-a".to_string()],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["payerSladeCode"], 1001);
        assert_eq!(json["memberNumber"], "MEM-1");
        assert_eq!(json["uid"], "user-1");
        assert_eq!(json["pushToken"][0], "tok-a");
    }

    #[test]
    fn test_membership_record_deserializes_from_upstream_keys() {
        let json = r#"{"phone":"+254700000001","payerSladeCode":"1001","memberNumber":"MEM-1"}"#;
        let record: MembershipRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.phone_number, "+254700000001");
        assert_eq!(record.payer_slade_code, "1001");
        assert_eq!(record.member_number, "MEM-1");
    }
}
