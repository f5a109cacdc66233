//! HTTP API tests for covlink-edi
//!
//! Drive the real router with tower::ServiceExt::oneshot against an
//! in-memory database, with a scripted in-process EDI gateway behind it.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt; // for `oneshot` method

use covlink_edi::db::profiles::insert_profile;
use covlink_edi::db::review::SqlReviewQueue;
use covlink_edi::models::{Profile, ReviewTicket, TicketState};
use covlink_edi::services::edi_client::EdiClient;
use covlink_edi::stores::ReviewQueue;
use covlink_edi::{build_router, AppState};

const PHONE: &str = "+254700000001";

/// Bind a gateway with fixed responses on an ephemeral port.
async fn spawn_gateway(
    lookup_body: serde_json::Value,
    link_status: u16,
    link_body: serde_json::Value,
) -> String {
    let lookup = move || {
        let body = lookup_body.clone();
        async move { Json(body) }
    };
    let link = move || {
        let body = link_body.clone();
        async move { (StatusCode::from_u16(link_status).unwrap(), Json(body)) }
    };

    let app = Router::new()
        .route("/internal/slader_data", get(lookup))
        .route("/internal/link_cover", post(link));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Gateway that answers the lookup with a plain status and raw body.
async fn spawn_failing_lookup_gateway(status: u16, body: &'static str) -> String {
    let lookup = move || async move { (StatusCode::from_u16(status).unwrap(), body) };

    let app = Router::new().route("/internal/slader_data", get(lookup));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn setup_state(edi_base_url: &str) -> AppState {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    covlink_edi::db::init_tables(&pool).await.unwrap();

    let edi = EdiClient::new(edi_base_url, Duration::from_secs(5)).unwrap();
    AppState::new(pool, edi)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> serde_json::Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

#[tokio::test]
async fn test_health_reports_module_identity() {
    // The gateway is never contacted by the health endpoint.
    let state = setup_state("http://localhost:9").await;
    let app = build_router(state);

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "covlink-edi");
    assert!(json["version"].is_string());
    assert!(json["uptime_seconds"].as_i64().unwrap() >= 0);
}

#[tokio::test]
async fn test_pending_count_counts_only_pending_tickets() {
    let state = setup_state("http://localhost:9").await;

    let queue = SqlReviewQueue::new(state.db.clone());
    let pending = ReviewTicket::pending(1001, "MEM-1", "Akinyi", "Odhiambo", PHONE, "rejected");
    queue.save_cover_linking_notification(&pending).await.unwrap();

    let mut resolved = ReviewTicket::pending(2002, "MEM-2", "Akinyi", "Odhiambo", PHONE, "other");
    resolved.state = TicketState::Resolved;
    queue
        .save_cover_linking_notification(&resolved)
        .await
        .unwrap();

    let app = build_router(state);
    let response = app
        .oneshot(get_request("/api/review/pending_count"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["pending"], 1);
}

#[tokio::test]
async fn test_link_cover_reports_successful_attempt() {
    let base_url = spawn_gateway(
        json!([{ "phone": PHONE, "payerSladeCode": "1001", "memberNumber": "MEM-1" }]),
        200,
        json!({}),
    )
    .await;
    let state = setup_state(&base_url).await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/covers/link",
            json!({ "phone_number": PHONE, "uid": "user-1", "push_tokens": ["tok-1"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["linked"], true);
    assert_eq!(json["upstream_status"], 200);
}

#[tokio::test]
async fn test_link_cover_with_no_memberships_reports_no_attempt() {
    let base_url = spawn_gateway(json!([]), 200, json!({})).await;
    let state = setup_state(&base_url).await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/covers/link",
            json!({ "phone_number": PHONE, "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["linked"], false);
    assert!(json.get("upstream_status").is_none());
}

#[tokio::test]
async fn test_invalid_slade_code_maps_to_bad_request() {
    let base_url = spawn_gateway(
        json!([{ "phone": PHONE, "payerSladeCode": "abc", "memberNumber": "MEM-1" }]),
        200,
        json!({}),
    )
    .await;
    let state = setup_state(&base_url).await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/covers/link",
            json!({ "phone_number": PHONE, "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("failed to convert slade code to an int"));
}

#[tokio::test]
async fn test_link_member_without_profile_maps_to_not_found() {
    let base_url = spawn_gateway(json!([]), 200, json!({})).await;
    let state = setup_state(&base_url).await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/covers/link_member",
            json!({ "phone_number": PHONE, "member_number": "MEM-9", "payer_slade_code": 2002 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert!(json["error"]["message"].as_str().unwrap().contains(PHONE));
}

#[tokio::test]
async fn test_link_member_with_profile_succeeds() {
    let base_url = spawn_gateway(json!([]), 200, json!({})).await;
    let state = setup_state(&base_url).await;

    let profile = Profile {
        uid: "user-7".to_string(),
        phone_number: PHONE.to_string(),
        first_name: "Akinyi".to_string(),
        last_name: "Odhiambo".to_string(),
        push_tokens: vec!["tok-1".to_string()],
        suspended: false,
    };
    insert_profile(&state.db, &profile).await.unwrap();

    let app = build_router(state);
    let response = app
        .oneshot(post_json(
            "/api/covers/link_member",
            json!({ "phone_number": PHONE, "member_number": "MEM-9", "payer_slade_code": 2002 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["linked"], true);
    assert_eq!(json["upstream_status"], 200);
}

#[tokio::test]
async fn test_gateway_lookup_failure_maps_to_bad_gateway() {
    let base_url = spawn_failing_lookup_gateway(500, "upstream exploded").await;
    let state = setup_state(&base_url).await;
    let app = build_router(state);

    let response = app
        .oneshot(post_json(
            "/api/covers/link",
            json!({ "phone_number": PHONE, "uid": "user-1" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = extract_json(response.into_body()).await;
    assert_eq!(json["error"]["code"], "UPSTREAM_ERROR");
}
