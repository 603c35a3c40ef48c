//! Price-index routes.
//!
//! Bulk refresh of index values (scoped to a simulation group when one
//! is given) and simple series statistics.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use safeharbor_db::repositories::{NewPriceIndex, PriceIndexError, PriceIndexRepository};

use crate::AppState;

/// Creates the price-index routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/indices/refresh", post(refresh_indices))
        .route("/indices/stats", get(index_stats))
}

/// One index value in a refresh request.
#[derive(Debug, Deserialize)]
pub struct IndexValueRequest {
    /// Calendar year.
    pub year: i32,
    /// Calendar month 1-12.
    pub month: i32,
    /// Index value.
    pub value: Decimal,
}

/// Request body for a bulk refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Country whose series is replaced; defaults to the configured
    /// country.
    pub country_id: Option<i32>,
    /// Simulation group to replace; the published series when absent.
    pub simulation_group: Option<i32>,
    /// Replacement values.
    pub values: Vec<IndexValueRequest>,
}

/// POST `/indices/refresh` - Replace one scope of index values.
async fn refresh_indices(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> impl IntoResponse {
    let repository = PriceIndexRepository::new((*state.db).clone());
    let country_id = request
        .country_id
        .unwrap_or(state.etl_config.default_country_id);
    let values = request
        .values
        .into_iter()
        .map(|v| NewPriceIndex {
            year: v.year,
            month: v.month,
            country_id,
            value: v.value,
        })
        .collect();

    match repository
        .refresh(country_id, request.simulation_group, values)
        .await
    {
        Ok(inserted) => (StatusCode::OK, Json(json!({ "inserted": inserted }))).into_response(),
        Err(PriceIndexError::MonthOutOfRange(month)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "validation_error",
                "message": format!("month must be within 1-12, got {month}")
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to refresh price indices");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}

/// GET `/indices/stats` - Count stored values by series.
async fn index_stats(State(state): State<AppState>) -> impl IntoResponse {
    let repository = PriceIndexRepository::new((*state.db).clone());
    match repository.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => {
            error!(error = %e, "failed to read price-index stats");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}
