//! API server — builds the HTTP router and the metrics exporter.

use crate::golden_rest::{self, GoldenState};
use crate::matching_rest::{self, MatchingState};
use crate::rest::{self, AppState};
use crate::sources_rest::{self, SourcesState};
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use coalesce_core::config::AppConfig;
use coalesce_golden::GoldenRecordService;
use coalesce_matching::MatchingEngine;
use coalesce_store::MemoryStore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Main API server wiring the engine and services into axum routes.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<MemoryStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<MemoryStore>) -> Self {
        Self { config, store }
    }

    /// Build the full application router.
    pub fn into_router(&self) -> Router {
        let engine = Arc::new(MatchingEngine::new(self.store.clone()));
        let service = Arc::new(GoldenRecordService::new(self.store.clone()));

        let app_state = AppState {
            store: self.store.clone(),
            start_time: Instant::now(),
        };
        let sources_state = SourcesState {
            store: self.store.clone(),
            upload_dir: PathBuf::from(&self.config.upload.dir),
            max_upload_size_mb: self.config.upload.max_size_mb,
        };
        let matching_state = MatchingState {
            engine,
            service: service.clone(),
            default_threshold: self.config.matching.default_threshold,
        };
        let golden_state = GoldenState { service };

        // Operational routes
        let ops_routes = Router::new()
            .route("/health", get(rest::health_check))
            .route("/api/dashboard/stats", get(rest::dashboard_stats))
            .with_state(app_state);

        // Data source routes
        let upload_limit_bytes =
            (self.config.upload.max_size_mb as usize + 1) * 1024 * 1024;
        let sources_routes = Router::new()
            .route("/api/sources/upload", post(sources_rest::upload_source))
            .route("/api/sources", get(sources_rest::list_sources))
            .route(
                "/api/sources/:source_id",
                get(sources_rest::get_source).delete(sources_rest::delete_source),
            )
            .route(
                "/api/sources/:source_id/preview",
                get(sources_rest::preview_source),
            )
            .route(
                "/api/sources/:source_id/auto-map",
                get(sources_rest::auto_map_source),
            )
            .route(
                "/api/sources/:source_id/import",
                post(sources_rest::import_source),
            )
            .route(
                "/api/sources/:source_id/records",
                get(sources_rest::source_records),
            )
            .layer(DefaultBodyLimit::max(upload_limit_bytes))
            .with_state(sources_state);

        // Matching routes
        let matching_routes = Router::new()
            .route("/api/matching/run", post(matching_rest::run_matching))
            .route("/api/matches", get(matching_rest::list_matches))
            .route("/api/matches/stats", get(matching_rest::match_stats))
            .route("/api/matches/:match_id", get(matching_rest::get_match))
            .route(
                "/api/matches/:match_id/review",
                put(matching_rest::review_match),
            )
            .with_state(matching_state);

        // Golden record routes
        let golden_routes = Router::new()
            .route("/api/golden-records/merge", post(golden_rest::merge_match))
            .route(
                "/api/golden-records/promote-unmatched",
                post(golden_rest::promote_unmatched),
            )
            .route(
                "/api/golden-records",
                get(golden_rest::list_golden_records),
            )
            .route(
                "/api/golden-records/count",
                get(golden_rest::golden_record_count),
            )
            .route(
                "/api/golden-records/export",
                get(golden_rest::export_golden_records),
            )
            .route(
                "/api/golden-records/:golden_id",
                get(golden_rest::get_golden_record),
            )
            .with_state(golden_state);

        Router::new()
            .merge(ops_routes)
            .merge(sources_routes)
            .merge(matching_routes)
            .merge(golden_routes)
            .merge(
                SwaggerUi::new("/docs")
                    .url("/api-docs/openapi.json", crate::swagger::ApiDoc::openapi()),
            )
            .layer(CompressionLayer::new())
            .layer(self.cors_layer())
            .layer(TraceLayer::new_for_http())
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins = &self.config.api.cors_origins;
        if origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Start the Prometheus exporter on its own port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
