//! Golden-record REST endpoints: merge, promotion, listing, and export.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use coalesce_core::error::MdmError;
use coalesce_core::fields::StandardField;
use coalesce_golden::planner::SurvivingValues;
use coalesce_golden::{GoldenRecordDetail, GoldenRecordService};

use crate::rest::{error_response, ErrorResponse};

/// Shared state for golden-record endpoints.
#[derive(Clone)]
pub struct GoldenState {
    pub service: Arc<GoldenRecordService>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MergeRequest {
    pub match_id: Uuid,
    /// Operator-chosen surviving values; fields not named keep the
    /// auto-planned value.
    pub surviving_values: Option<HashMap<String, Option<String>>>,
}

#[derive(Serialize, ToSchema)]
pub struct MergeResponse {
    pub message: String,
    pub golden_record_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct PromoteResponse {
    pub message: String,
    pub count: u32,
}

#[derive(Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub search: Option<String>,
}

/// POST /api/golden-records/merge — Merge a candidate's records.
#[utoipa::path(
    post,
    path = "/api/golden-records/merge",
    tag = "Golden Records",
    request_body = MergeRequest,
    responses(
        (status = 200, body = MergeResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
        (status = 409, body = ErrorResponse),
    )
)]
pub async fn merge_match(
    State(state): State<GoldenState>,
    Json(request): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let surviving = request
        .surviving_values
        .map(parse_surviving_values)
        .transpose()
        .map_err(error_response)?;

    let golden = state
        .service
        .merge(request.match_id, surviving.as_ref())
        .map_err(error_response)?;

    metrics::counter!("golden.api.merges").increment(1);
    Ok(Json(MergeResponse {
        message: "Records merged successfully".to_string(),
        golden_record_id: golden.id,
    }))
}

/// POST /api/golden-records/promote-unmatched — Solo goldens for every
/// unmatched record without pending candidates.
#[utoipa::path(
    post,
    path = "/api/golden-records/promote-unmatched",
    tag = "Golden Records",
    responses((status = 200, body = PromoteResponse))
)]
pub async fn promote_unmatched(
    State(state): State<GoldenState>,
) -> Result<Json<PromoteResponse>, (StatusCode, Json<ErrorResponse>)> {
    let count = state.service.promote_unmatched().map_err(error_response)?;
    metrics::counter!("golden.api.promotions").increment(count as u64);
    Ok(Json(PromoteResponse {
        message: format!("Promoted {count} records to golden records"),
        count,
    }))
}

/// GET /api/golden-records — List golden records, newest update first.
#[utoipa::path(
    get,
    path = "/api/golden-records",
    tag = "Golden Records",
    params(
        ("skip" = Option<usize>, Query, description = "Offset into the sorted list"),
        ("limit" = Option<usize>, Query, description = "Page size, default 50"),
        ("search" = Option<String>, Query, description = "Case-insensitive name/email filter"),
    ),
    responses((status = 200, body = [GoldenRecordDetail]))
)]
pub async fn list_golden_records(
    State(state): State<GoldenState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<GoldenRecordDetail>> {
    Json(state.service.list_goldens(
        query.skip.unwrap_or(0),
        query.limit.unwrap_or(50),
        query.search.as_deref(),
    ))
}

/// GET /api/golden-records/count — Total golden records.
#[utoipa::path(
    get,
    path = "/api/golden-records/count",
    tag = "Golden Records",
    responses((status = 200, body = CountResponse))
)]
pub async fn golden_record_count(State(state): State<GoldenState>) -> Json<CountResponse> {
    Json(CountResponse {
        count: state.service.golden_count(),
    })
}

/// GET /api/golden-records/export — All golden records as CSV.
#[utoipa::path(
    get,
    path = "/api/golden-records/export",
    tag = "Golden Records",
    responses((status = 200, content_type = "text/csv", body = String))
)]
pub async fn export_golden_records(
    State(state): State<GoldenState>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let csv = state.service.export_csv().map_err(error_response)?;
    metrics::counter!("golden.api.exports").increment(1);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=golden_records_export.csv",
            ),
        ],
        csv,
    ))
}

/// GET /api/golden-records/{golden_id} — One golden record with sources.
#[utoipa::path(
    get,
    path = "/api/golden-records/{golden_id}",
    tag = "Golden Records",
    params(("golden_id" = Uuid, Path, description = "Golden record id")),
    responses(
        (status = 200, body = GoldenRecordDetail),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn get_golden_record(
    State(state): State<GoldenState>,
    Path(golden_id): Path<Uuid>,
) -> Result<Json<GoldenRecordDetail>, (StatusCode, Json<ErrorResponse>)> {
    state
        .service
        .get_golden(golden_id)
        .map(Json)
        .map_err(error_response)
}

fn parse_surviving_values(
    values: HashMap<String, Option<String>>,
) -> Result<SurvivingValues, MdmError> {
    values
        .into_iter()
        .map(|(name, value)| StandardField::from_str(&name).map(|field| (field, value)))
        .collect()
}
