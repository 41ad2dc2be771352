//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Coalesce API",
        version = "0.1.0",
        description = "Master Data Management engine: deduplicates customer records from heterogeneous tabular sources into a canonical golden-record set.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Operations", description = "Health and dashboard statistics"),
        (name = "Data Sources", description = "Upload, preview, column mapping, and record import"),
        (name = "Matching", description = "Duplicate detection runs and candidate review"),
        (name = "Golden Records", description = "Merging, promotion, listing, and CSV export"),
    ),
    paths(
        // Operations
        crate::rest::health_check,
        crate::rest::dashboard_stats,
        // Data sources
        crate::sources_rest::upload_source,
        crate::sources_rest::list_sources,
        crate::sources_rest::get_source,
        crate::sources_rest::delete_source,
        crate::sources_rest::preview_source,
        crate::sources_rest::auto_map_source,
        crate::sources_rest::import_source,
        crate::sources_rest::source_records,
        // Matching
        crate::matching_rest::run_matching,
        crate::matching_rest::list_matches,
        crate::matching_rest::match_stats,
        crate::matching_rest::get_match,
        crate::matching_rest::review_match,
        // Golden records
        crate::golden_rest::merge_match,
        crate::golden_rest::promote_unmatched,
        crate::golden_rest::list_golden_records,
        crate::golden_rest::golden_record_count,
        crate::golden_rest::export_golden_records,
        crate::golden_rest::get_golden_record,
    ),
    components(schemas(
        // Core entities
        coalesce_core::fields::StandardField,
        coalesce_core::types::DataSource,
        coalesce_core::types::SourceStatus,
        coalesce_core::types::FileType,
        coalesce_core::types::CustomerRecord,
        coalesce_core::types::MatchCandidate,
        coalesce_core::types::MatchStatus,
        coalesce_core::types::GoldenRecord,
        // Service types
        coalesce_golden::MatchCandidateDetail,
        coalesce_golden::GoldenRecordDetail,
        coalesce_golden::CandidateStats,
        coalesce_ingest::FilePreview,
        // REST types
        crate::rest::ErrorResponse,
        crate::rest::MessageResponse,
        crate::rest::HealthResponse,
        crate::rest::DashboardStats,
        crate::matching_rest::MatchRunRequest,
        crate::matching_rest::MatchRunResponse,
        crate::matching_rest::ReviewRequest,
        crate::golden_rest::MergeRequest,
        crate::golden_rest::MergeResponse,
        crate::golden_rest::PromoteResponse,
        crate::golden_rest::CountResponse,
        crate::sources_rest::AutoMapResponse,
        crate::sources_rest::ImportRequest,
        crate::sources_rest::ImportResponse,
    ))
)]
pub struct ApiDoc;
