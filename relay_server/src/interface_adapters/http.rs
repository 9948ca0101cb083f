// Shared HTTP response types for consistent API error payloads.

use axum::{Json, http::StatusCode, response::IntoResponse};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}

// Unknown routes still answer with the JSON error schema.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
}
