use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{error, instrument};
use crate::error::ApiError;
use crate::schemas::{AppState, ErrorResponse, HealthResponse};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 500, description = "Service is unhealthy", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    // Test database connection
    if let Err(e) = state.db.ping().await {
        error!("Database ping failed: {}", e);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("DATABASE_UNAVAILABLE", "Database is unreachable")),
        ));
    }

    let response = HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "connected".to_string(),
    };

    Ok(Json(response))
}
