//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod companies;
pub mod health;
pub mod indices;
pub mod runs;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(runs::routes())
        .merge(indices::routes())
        .merge(companies::routes())
}
