//! Matching REST endpoints: run the engine, list and review candidates.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use coalesce_core::error::MdmError;
use coalesce_core::fields::StandardField;
use coalesce_core::types::MatchStatus;
use coalesce_golden::{CandidateStats, GoldenRecordService, MatchCandidateDetail, ReviewDecision};
use coalesce_matching::{MatchRunConfig, MatchingEngine};

use crate::rest::{error_response, ErrorResponse, MessageResponse};

/// Shared state for matching endpoints.
#[derive(Clone)]
pub struct MatchingState {
    pub engine: Arc<MatchingEngine>,
    pub service: Arc<GoldenRecordService>,
    pub default_threshold: f64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct MatchRunRequest {
    pub threshold: Option<f64>,
    /// Standard field name -> weight; replaces the default weights.
    pub field_weights: Option<HashMap<String, f64>>,
}

#[derive(Serialize, ToSchema)]
pub struct MatchRunResponse {
    pub message: String,
    pub match_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct RunQuery {
    pub source_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    /// "approved" or "rejected".
    pub status: String,
    pub notes: Option<String>,
}

/// POST /api/matching/run — Find duplicate candidates, optionally scoped
/// to one source.
#[utoipa::path(
    post,
    path = "/api/matching/run",
    tag = "Matching",
    request_body = MatchRunRequest,
    params(("source_id" = Option<Uuid>, Query, description = "Only match records from this source")),
    responses(
        (status = 200, body = MatchRunResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn run_matching(
    State(state): State<MatchingState>,
    Query(query): Query<RunQuery>,
    body: Option<Json<MatchRunRequest>>,
) -> Result<Json<MatchRunResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Json(request) = body.unwrap_or_default();

    let field_weights = request
        .field_weights
        .map(parse_field_weights)
        .transpose()
        .map_err(error_response)?;

    let config = MatchRunConfig {
        source_id: query.source_id,
        threshold: request.threshold.unwrap_or(state.default_threshold),
        field_weights,
    };

    // The scan is pure compute over a store snapshot; keep it off the
    // async worker threads.
    let engine = state.engine.clone();
    let emitted = tokio::task::spawn_blocking(move || engine.run(&config))
        .await
        .map_err(|e| error_response(MdmError::Internal(e.into())))?
        .map_err(error_response)?;

    metrics::counter!("matching.api.runs").increment(1);
    Ok(Json(MatchRunResponse {
        message: format!("Found {} match candidates", emitted.len()),
        match_count: emitted.len() as u64,
    }))
}

/// GET /api/matches — List candidates, highest score first.
#[utoipa::path(
    get,
    path = "/api/matches",
    tag = "Matching",
    params(
        ("status" = Option<String>, Query, description = "pending, approved, rejected, or merged"),
        ("skip" = Option<usize>, Query, description = "Offset into the sorted list"),
        ("limit" = Option<usize>, Query, description = "Page size, default 50"),
    ),
    responses(
        (status = 200, body = [MatchCandidateDetail]),
        (status = 400, body = ErrorResponse),
    )
)]
pub async fn list_matches(
    State(state): State<MatchingState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<MatchCandidateDetail>>, (StatusCode, Json<ErrorResponse>)> {
    let status = query
        .status
        .as_deref()
        .map(parse_status)
        .transpose()
        .map_err(error_response)?;
    let listed = state
        .service
        .list_candidates(status, query.skip.unwrap_or(0), query.limit.unwrap_or(50));
    Ok(Json(listed))
}

/// GET /api/matches/stats — Candidate counts per status.
#[utoipa::path(
    get,
    path = "/api/matches/stats",
    tag = "Matching",
    responses((status = 200, body = CandidateStats))
)]
pub async fn match_stats(State(state): State<MatchingState>) -> Json<CandidateStats> {
    Json(state.service.candidate_stats())
}

/// GET /api/matches/{match_id} — One candidate with both records.
#[utoipa::path(
    get,
    path = "/api/matches/{match_id}",
    tag = "Matching",
    params(("match_id" = Uuid, Path, description = "Match candidate id")),
    responses(
        (status = 200, body = MatchCandidateDetail),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn get_match(
    State(state): State<MatchingState>,
    Path(match_id): Path<Uuid>,
) -> Result<Json<MatchCandidateDetail>, (StatusCode, Json<ErrorResponse>)> {
    state
        .service
        .get_candidate(match_id)
        .map(Json)
        .map_err(error_response)
}

/// PUT /api/matches/{match_id}/review — Approve or reject a candidate.
#[utoipa::path(
    put,
    path = "/api/matches/{match_id}/review",
    tag = "Matching",
    request_body = ReviewRequest,
    params(("match_id" = Uuid, Path, description = "Match candidate id")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse),
    )
)]
pub async fn review_match(
    State(state): State<MatchingState>,
    Path(match_id): Path<Uuid>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let decision = match request.status.as_str() {
        "approved" => ReviewDecision::Approved,
        "rejected" => ReviewDecision::Rejected,
        other => {
            return Err(error_response(MdmError::InvalidInput(format!(
                "Status must be 'approved' or 'rejected', got '{other}'"
            ))))
        }
    };
    state
        .service
        .review(match_id, decision, request.notes)
        .map_err(error_response)?;
    metrics::counter!("matching.api.reviews").increment(1);
    Ok(Json(MessageResponse {
        message: format!("Match {}", request.status),
    }))
}

fn parse_status(status: &str) -> Result<MatchStatus, MdmError> {
    match status {
        "pending" => Ok(MatchStatus::Pending),
        "approved" => Ok(MatchStatus::Approved),
        "rejected" => Ok(MatchStatus::Rejected),
        "merged" => Ok(MatchStatus::Merged),
        other => Err(MdmError::InvalidInput(format!("Invalid status: {other}"))),
    }
}

fn parse_field_weights(
    weights: HashMap<String, f64>,
) -> Result<BTreeMap<StandardField, f64>, MdmError> {
    weights
        .into_iter()
        .map(|(name, weight)| StandardField::from_str(&name).map(|field| (field, weight)))
        .collect()
}
