use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{instrument, warn};
use crate::schemas::{AppState, HealthResponse};

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
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let db_status = match state.db.ping().await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            warn!("Database ping failed: {}", e);
            "disconnected".to_string()
        }
    };

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}
