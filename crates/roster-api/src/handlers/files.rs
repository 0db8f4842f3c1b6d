//! Authenticated reads of locally stored photos and logos.
//!
//! Only the local backend serves bytes through here; remote backends hand out
//! signed URLs instead.

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use roster_core::AppError;
use roster_storage::keys::validate_key;
use roster_storage::StorageBackend;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Member uploads overwrite their key, so clients revalidate every time.
const CACHE_CONTROL: &str = "private, no-cache";

fn etag_for(data: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Sha256::digest(data)))
}

fn etag_matches(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get_all(header::IF_NONE_MATCH)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|v| v.trim())
        .any(|v| v == "*" || v.trim_start_matches("W/") == etag)
}

fn content_type_for(key: &str) -> &'static str {
    let ext = key
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{key}",
    tag = "files",
    params(("key" = String, Path, description = "Storage key, e.g. profileimages/photo-1-abc.jpg")),
    responses(
        (status = 200, description = "File content"),
        (status = 304, description = "Unchanged since the ETag in If-None-Match"),
        (status = 400, description = "Invalid key", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip(state, _auth, headers), fields(operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    _auth: AuthContext,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    if state.storage.backend_type() != StorageBackend::Local {
        return Err(AppError::NotFound("File not found".to_string()).into());
    }

    validate_key(&key)?;
    let data = state.storage.download(&key).await?;
    let etag = etag_for(&data);

    let builder = Response::builder()
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, CACHE_CONTROL);

    let response = if etag_matches(&headers, &etag) {
        builder.status(StatusCode::NOT_MODIFIED).body(Body::empty())
    } else {
        builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(&key))
            .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
            .body(Body::from(data))
    };

    response.map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)).into())
}
