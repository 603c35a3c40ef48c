//! Company configuration routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use safeharbor_db::repositories::{
    CompanyError, CompanyRepository, CreateCompanyInput, UpdateCompanyInput,
};

use crate::AppState;

/// Creates the company configuration routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(list_companies))
        .route("/companies", post(create_company))
        .route("/companies/{id}", get(get_company))
        .route("/companies/{id}", put(update_company))
        .route("/companies/{id}", delete(delete_company))
}

/// Request body for creating a company configuration.
#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    /// Company identifier in the source ledger.
    pub company_id: i32,
    /// Display name.
    pub name: String,
    /// Source ledger connection URL.
    pub source_url: String,
    /// Optional custom extraction query.
    pub custom_query: Option<String>,
    /// Whether runs may be started; defaults to true.
    pub active: Option<bool>,
}

/// Request body for updating a company configuration.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateCompanyRequest {
    /// New display name.
    pub name: Option<String>,
    /// New source ledger connection URL.
    pub source_url: Option<String>,
    /// New custom extraction query.
    pub custom_query: Option<Option<String>>,
    /// New active flag.
    pub active: Option<bool>,
}

fn company_error_response(e: &CompanyError) -> axum::response::Response {
    match e {
        CompanyError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "not_found", "message": format!("company {id} is not configured") })),
        )
            .into_response(),
        CompanyError::Inactive(id) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "validation_error", "message": format!("company {id} is inactive") })),
        )
            .into_response(),
        CompanyError::AlreadyExists(id) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "conflict", "message": format!("company {id} is already configured") })),
        )
            .into_response(),
        CompanyError::Database(_) => {
            error!(error = %e, "company repository error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal_error", "message": "An error occurred" })),
            )
                .into_response()
        }
    }
}

/// GET `/companies` - List all company configurations.
async fn list_companies(State(state): State<AppState>) -> impl IntoResponse {
    let repository = CompanyRepository::new((*state.db).clone());
    match repository.list().await {
        Ok(companies) => (StatusCode::OK, Json(json!({ "companies": companies }))).into_response(),
        Err(e) => company_error_response(&e),
    }
}

/// GET `/companies/{id}` - Fetch one company configuration.
async fn get_company(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let repository = CompanyRepository::new((*state.db).clone());
    match repository.find(id).await {
        Ok(Some(company)) => (StatusCode::OK, Json(company)).into_response(),
        Ok(None) => company_error_response(&CompanyError::NotFound(id)),
        Err(e) => company_error_response(&e),
    }
}

/// POST `/companies` - Create a company configuration.
async fn create_company(
    State(state): State<AppState>,
    Json(request): Json<CreateCompanyRequest>,
) -> impl IntoResponse {
    let repository = CompanyRepository::new((*state.db).clone());
    let input = CreateCompanyInput {
        company_id: request.company_id,
        name: request.name,
        source_url: request.source_url,
        custom_query: request.custom_query,
        active: request.active.unwrap_or(true),
    };
    match repository.create(input).await {
        Ok(company) => (StatusCode::CREATED, Json(company)).into_response(),
        Err(e) => company_error_response(&e),
    }
}

/// PUT `/companies/{id}` - Update a company configuration.
async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCompanyRequest>,
) -> impl IntoResponse {
    let repository = CompanyRepository::new((*state.db).clone());
    let input = UpdateCompanyInput {
        name: request.name,
        source_url: request.source_url,
        custom_query: request.custom_query,
        active: request.active,
    };
    match repository.update(id, input).await {
        Ok(company) => (StatusCode::OK, Json(company)).into_response(),
        Err(e) => company_error_response(&e),
    }
}

/// DELETE `/companies/{id}` - Remove a company configuration.
async fn delete_company(State(state): State<AppState>, Path(id): Path<i32>) -> impl IntoResponse {
    let repository = CompanyRepository::new((*state.db).clone());
    match repository.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => company_error_response(&e),
    }
}
