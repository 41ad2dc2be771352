//! Data-source REST endpoints: upload, preview, mapping, and import.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use coalesce_core::error::MdmError;
use coalesce_core::fields::StandardField;
use coalesce_core::types::{CustomerRecord, DataSource, FileType};
use coalesce_ingest::reader::TableData;
use coalesce_ingest::{auto_map_columns, import_records, preview, read_table, FilePreview};
use coalesce_store::MemoryStore;

use crate::rest::{error_response, ErrorResponse, MessageResponse};

/// Shared state for data-source endpoints.
#[derive(Clone)]
pub struct SourcesState {
    pub store: Arc<MemoryStore>,
    pub upload_dir: PathBuf,
    pub max_upload_size_mb: u64,
}

impl SourcesState {
    fn stored_file_path(&self, source: &DataSource) -> PathBuf {
        self.upload_dir
            .join(format!("{}.{}", source.id, source.file_type.extension()))
    }
}

#[derive(Serialize, ToSchema)]
pub struct AutoMapResponse {
    pub suggested_mapping: HashMap<String, StandardField>,
    pub source_columns: Vec<String>,
    pub standard_fields: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportRequest {
    /// Source column name -> standard field name.
    pub mapping: HashMap<String, String>,
}

#[derive(Serialize, ToSchema)]
pub struct ImportResponse {
    pub message: String,
    pub record_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

/// POST /api/sources/upload — Upload a CSV or Excel file.
#[utoipa::path(
    post,
    path = "/api/sources/upload",
    tag = "Data Sources",
    responses(
        (status = 200, body = DataSource),
        (status = 400, body = ErrorResponse),
    )
)]
pub async fn upload_source(
    State(state): State<SourcesState>,
    mut multipart: Multipart,
) -> Result<Json<DataSource>, (StatusCode, Json<ErrorResponse>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(MdmError::InvalidInput(e.to_string())))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| error_response(MdmError::InvalidInput(e.to_string())))?;
                upload = Some((file_name, bytes.to_vec()));
            }
            Some("name") => {
                name = field.text().await.ok().filter(|n| !n.is_empty());
            }
            _ => {}
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        error_response(MdmError::InvalidInput(
            "Multipart field 'file' is required".to_string(),
        ))
    })?;

    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let file_type = FileType::from_extension(&extension).ok_or_else(|| {
        error_response(MdmError::InvalidInput(
            "Only CSV and Excel files are supported".to_string(),
        ))
    })?;

    let size_mb = bytes.len() as u64 / (1024 * 1024);
    if size_mb >= state.max_upload_size_mb {
        return Err(error_response(MdmError::InvalidInput(format!(
            "File too large. Max: {}MB",
            state.max_upload_size_mb
        ))));
    }

    let source = DataSource::new(name.unwrap_or_else(|| file_name.clone()), file_name, file_type);

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(MdmError::Io)
        .map_err(error_response)?;
    tokio::fs::write(state.stored_file_path(&source), &bytes)
        .await
        .map_err(MdmError::Io)
        .map_err(error_response)?;

    let stored = source.clone();
    state
        .store
        .transaction(move |txn| {
            txn.insert_source(stored);
            Ok(())
        })
        .map_err(error_response)?;

    metrics::counter!("sources.api.uploads").increment(1);
    info!(source_id = %source.id, file = %source.file_name, "Source uploaded");
    Ok(Json(source))
}

/// GET /api/sources — List data sources, newest first.
#[utoipa::path(
    get,
    path = "/api/sources",
    tag = "Data Sources",
    responses((status = 200, body = [DataSource]))
)]
pub async fn list_sources(State(state): State<SourcesState>) -> Json<Vec<DataSource>> {
    Json(state.store.read(|s| s.list_sources()))
}

/// GET /api/sources/{source_id} — One data source.
#[utoipa::path(
    get,
    path = "/api/sources/{source_id}",
    tag = "Data Sources",
    params(("source_id" = Uuid, Path, description = "Data source id")),
    responses(
        (status = 200, body = DataSource),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn get_source(
    State(state): State<SourcesState>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<DataSource>, (StatusCode, Json<ErrorResponse>)> {
    find_source(&state, source_id).map(Json).map_err(error_response)
}

/// DELETE /api/sources/{source_id} — Delete a source and its records.
#[utoipa::path(
    delete,
    path = "/api/sources/{source_id}",
    tag = "Data Sources",
    params(("source_id" = Uuid, Path, description = "Data source id")),
    responses(
        (status = 200, body = MessageResponse),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn delete_source(
    State(state): State<SourcesState>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let source = state
        .store
        .transaction(|txn| txn.delete_source(source_id))
        .map_err(error_response)?;

    let path = state.stored_file_path(&source);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!(path = %path.display(), error = %e, "Could not remove uploaded file");
    }

    info!(source_id = %source_id, "Source deleted");
    Ok(Json(MessageResponse {
        message: "Deleted successfully".to_string(),
    }))
}

/// GET /api/sources/{source_id}/preview — Columns and sample rows.
#[utoipa::path(
    get,
    path = "/api/sources/{source_id}/preview",
    tag = "Data Sources",
    params(("source_id" = Uuid, Path, description = "Data source id")),
    responses(
        (status = 200, body = FilePreview),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn preview_source(
    State(state): State<SourcesState>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<FilePreview>, (StatusCode, Json<ErrorResponse>)> {
    let table = load_table(&state, source_id).map_err(error_response)?;
    Ok(Json(preview(&table, 5)))
}

/// GET /api/sources/{source_id}/auto-map — Suggested column mapping.
#[utoipa::path(
    get,
    path = "/api/sources/{source_id}/auto-map",
    tag = "Data Sources",
    params(("source_id" = Uuid, Path, description = "Data source id")),
    responses(
        (status = 200, body = AutoMapResponse),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn auto_map_source(
    State(state): State<SourcesState>,
    Path(source_id): Path<Uuid>,
) -> Result<Json<AutoMapResponse>, (StatusCode, Json<ErrorResponse>)> {
    let table = load_table(&state, source_id).map_err(error_response)?;
    Ok(Json(AutoMapResponse {
        suggested_mapping: auto_map_columns(&table.columns),
        source_columns: table.columns,
        standard_fields: StandardField::ALL
            .iter()
            .map(|f| f.as_str().to_string())
            .collect(),
    }))
}

/// POST /api/sources/{source_id}/import — Import records using a mapping.
#[utoipa::path(
    post,
    path = "/api/sources/{source_id}/import",
    tag = "Data Sources",
    request_body = ImportRequest,
    params(("source_id" = Uuid, Path, description = "Data source id")),
    responses(
        (status = 200, body = ImportResponse),
        (status = 400, body = ErrorResponse),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn import_source(
    State(state): State<SourcesState>,
    Path(source_id): Path<Uuid>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ImportResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mapping = request
        .mapping
        .into_iter()
        .map(|(column, field)| StandardField::from_str(&field).map(|f| (column, f)))
        .collect::<Result<HashMap<String, StandardField>, MdmError>>()
        .map_err(error_response)?;

    let table = load_table(&state, source_id).map_err(error_response)?;
    let count = import_records(&state.store, source_id, &table, &mapping)
        .map_err(error_response)?;

    metrics::counter!("sources.api.imports").increment(1);
    Ok(Json(ImportResponse {
        message: format!("Imported {count} records"),
        record_count: count,
    }))
}

/// GET /api/sources/{source_id}/records — Records from one source.
#[utoipa::path(
    get,
    path = "/api/sources/{source_id}/records",
    tag = "Data Sources",
    params(
        ("source_id" = Uuid, Path, description = "Data source id"),
        ("skip" = Option<usize>, Query, description = "Offset"),
        ("limit" = Option<usize>, Query, description = "Page size, default 50"),
    ),
    responses(
        (status = 200, body = [CustomerRecord]),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn source_records(
    State(state): State<SourcesState>,
    Path(source_id): Path<Uuid>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<Vec<CustomerRecord>>, (StatusCode, Json<ErrorResponse>)> {
    find_source(&state, source_id).map_err(error_response)?;
    let records = state.store.read(|s| s.records_for_source(source_id));
    Ok(Json(
        records
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(50))
            .collect(),
    ))
}

fn find_source(state: &SourcesState, source_id: Uuid) -> Result<DataSource, MdmError> {
    state
        .store
        .read(|s| s.source(source_id).cloned())
        .ok_or_else(|| MdmError::NotFound(format!("Data source {source_id} not found")))
}

fn load_table(state: &SourcesState, source_id: Uuid) -> Result<TableData, MdmError> {
    let source = find_source(state, source_id)?;
    let path = state.stored_file_path(&source);
    if !path.exists() {
        return Err(MdmError::NotFound("File not found on disk".to_string()));
    }
    read_table(&path, source.file_type)
}
