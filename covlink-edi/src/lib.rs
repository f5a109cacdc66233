//! covlink-edi library interface
//!
//! Exposes the reconciliation pieces for the binary and for integration
//! tests: models, stores, the EDI client, the reconciler and the HTTP API.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod stores;

pub use error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::db::audit::SqlCoverEventStore;
use crate::db::profiles::SqlProfileRepository;
use crate::db::review::SqlReviewQueue;
use crate::services::edi_client::EdiClient;
use crate::services::reconciler::CoverReconciler;
use crate::stores::ReviewQueue;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Cover reconciliation orchestrator
    pub reconciler: Arc<CoverReconciler>,
    /// Review queue, for the read-side endpoints
    pub review: Arc<dyn ReviewQueue>,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Wire the sqlx-backed stores and the EDI client into a reconciler.
    pub fn new(db: SqlitePool, edi: EdiClient) -> Self {
        let review: Arc<dyn ReviewQueue> = Arc::new(SqlReviewQueue::new(db.clone()));
        let reconciler = CoverReconciler::new(
            edi,
            Arc::new(SqlProfileRepository::new(db.clone())),
            Arc::new(SqlCoverEventStore::new(db.clone())),
            review.clone(),
        );

        Self {
            db,
            reconciler: Arc::new(reconciler),
            review,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::cover_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
