//! Shared REST types, error mapping, and the health/dashboard endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use coalesce_core::error::MdmError;
use coalesce_core::types::MatchStatus;
use coalesce_store::MemoryStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

/// Shared application state for operational endpoints.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub start_time: Instant,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_sources: u64,
    pub total_records: u64,
    pub total_matches_pending: u64,
    pub total_matches_approved: u64,
    pub total_matches_rejected: u64,
    pub total_golden_records: u64,
    /// Candidates per hundred records, rounded to one decimal.
    pub duplicate_rate: f64,
}

/// Map a core error to its HTTP representation.
pub fn error_response(error: MdmError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match &error {
        MdmError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        MdmError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
        MdmError::InvalidStateTransition(_) => (StatusCode::CONFLICT, "invalid_state_transition"),
        MdmError::ConflictingGoldens(_) => (StatusCode::CONFLICT, "conflicting_goldens"),
        MdmError::Cancelled => (StatusCode::CONFLICT, "cancelled"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %error, "Request failed");
        metrics::counter!("api.errors").increment(1);
    }
    (
        status,
        Json(ErrorResponse {
            error: code.to_string(),
            message: error.to_string(),
        }),
    )
}

/// GET /health — Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Operations",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /api/dashboard/stats — Overall dashboard statistics.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    responses((status = 200, body = DashboardStats))
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let stats = state.store.read(|state| {
        let candidates = state.candidates_with_status(None);
        let count = |status: MatchStatus| {
            candidates.iter().filter(|c| c.status == status).count() as u64
        };
        let total_records = state.record_count() as u64;
        let duplicate_rate = if total_records > 0 {
            (candidates.len() as f64 / total_records as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        DashboardStats {
            total_sources: state.source_count() as u64,
            total_records,
            total_matches_pending: count(MatchStatus::Pending),
            total_matches_approved: count(MatchStatus::Approved),
            total_matches_rejected: count(MatchStatus::Rejected),
            total_golden_records: state.golden_count() as u64,
            duplicate_rate,
        }
    });
    Json(stats)
}
