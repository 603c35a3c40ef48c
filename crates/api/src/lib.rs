//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Run endpoints that spawn staging/valuation runs and return the
//!   run id for progress polling
//! - Progress and history endpoints
//! - Price-index refresh and company configuration routes

pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use safeharbor_core::progress::ProgressTracker;
use safeharbor_shared::config::EtlConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// In-process run progress registry.
    pub tracker: Arc<ProgressTracker>,
    /// Run configuration (batch size, persist throttle, country).
    pub etl_config: EtlConfig,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
