use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::Database;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Blob not found".to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Blobs
// ============================================================

/// Store a JSON document. Answers `201 Created` with the blob's `Location`.
pub async fn create_blob(
    State(db): State<Database>,
    body: String,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if let Err(e) = serde_json::from_str::<serde_json::Value>(&body) {
        tracing::warn!("Rejected blob: {}", e);
        return Err((StatusCode::BAD_REQUEST, format!("Body is not valid JSON: {}", e)));
    }

    let blob = db.create_blob(&body).map_err(internal_error)?;
    tracing::info!(blob_id = %blob.id, bytes = blob.body.len(), "Blob created");

    Ok((
        StatusCode::CREATED,
        [
            (header::LOCATION, format!("/api/jsonBlob/{}", blob.id)),
            (header::CONTENT_TYPE, "application/json".to_string()),
        ],
        blob.body,
    ))
}

pub async fn get_blob(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let blob = db
        .get_blob(id)
        .map_err(internal_error)?
        .ok_or_else(not_found)?;

    Ok((
        [(header::CONTENT_TYPE, "application/json".to_string())],
        blob.body,
    ))
}
