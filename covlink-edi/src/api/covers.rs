//! Cover-linking endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::AppState;

/// Body for POST /api/covers/link
#[derive(Debug, Deserialize)]
pub struct LinkCoverRequest {
    pub phone_number: String,
    pub uid: String,
    #[serde(default)]
    pub push_tokens: Vec<String>,
}

/// Body for POST /api/covers/link_member
#[derive(Debug, Deserialize)]
pub struct LinkMemberCoverRequest {
    pub phone_number: String,
    pub member_number: String,
    pub payer_slade_code: i64,
}

/// Summary of a link attempt as reported to callers
#[derive(Debug, Serialize)]
pub struct LinkAttemptResponse {
    /// Status the EDI gateway answered with, when a link call was made
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    /// True when the gateway accepted the link
    pub linked: bool,
}

/// Pending review ticket count
#[derive(Debug, Serialize)]
pub struct PendingCountResponse {
    pub pending: i64,
}

/// POST /api/covers/link
///
/// Discover and link whichever cover the legacy source holds for the phone
/// number. A gateway rejection still answers 200 here (the rejection is
/// queued for review); only transport, decode, slade-code and store
/// failures become error responses.
pub async fn link_cover(
    State(state): State<AppState>,
    Json(req): Json<LinkCoverRequest>,
) -> ApiResult<Json<LinkAttemptResponse>> {
    let response = state
        .reconciler
        .link_cover(&req.phone_number, &req.uid, &req.push_tokens)
        .await?;

    Ok(Json(match response {
        Some(resp) => LinkAttemptResponse {
            linked: resp.status == 200,
            upstream_status: Some(resp.status),
        },
        None => LinkAttemptResponse {
            linked: false,
            upstream_status: None,
        },
    }))
}

/// POST /api/covers/link_member
///
/// Link a cover whose member number and payer slade code are already known.
pub async fn link_member_cover(
    State(state): State<AppState>,
    Json(req): Json<LinkMemberCoverRequest>,
) -> ApiResult<Json<LinkAttemptResponse>> {
    let resp = state
        .reconciler
        .link_edi_member_cover(&req.phone_number, &req.member_number, req.payer_slade_code)
        .await?;

    Ok(Json(LinkAttemptResponse {
        linked: resp.status == 200,
        upstream_status: Some(resp.status),
    }))
}

/// GET /api/review/pending_count
pub async fn pending_review_count(
    State(state): State<AppState>,
) -> ApiResult<Json<PendingCountResponse>> {
    let pending = state.review.pending_count().await?;
    Ok(Json(PendingCountResponse { pending }))
}

/// Cover-linking and review routes
pub fn cover_routes() -> Router<AppState> {
    Router::new()
        .route("/api/covers/link", post(link_cover))
        .route("/api/covers/link_member", post(link_member_cover))
        .route("/api/review/pending_count", get(pending_review_count))
}
