//! On-demand revalidation
//!
//! Content tooling calls `POST /api/revalidate` with the shared bearer token
//! and a `{ "path": "/..." }` body; the cached page for that path is dropped
//! and re-rendered on the next request.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;

#[derive(Debug, Deserialize)]
struct RevalidateBody {
    path: Option<String>,
}

/// True when the request carries `Bearer <token>` for the configured token
///
/// Without a configured token every request is rejected.
fn is_authorized(headers: &HeaderMap, token: Option<&str>) -> bool {
    let Some(token) = token else {
        return false;
    };
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|provided| provided == token)
}

/// POST /api/revalidate
pub async fn revalidate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, RevalidateError> {
    if !is_authorized(&headers, state.revalidation_token.as_deref()) {
        warn!("Rejected revalidation request with missing or invalid token");
        return Err(RevalidateError::Unauthorized);
    }

    let path = serde_json::from_slice::<RevalidateBody>(&body)
        .ok()
        .and_then(|b| b.path)
        .filter(|p| !p.is_empty())
        .ok_or(RevalidateError::MissingPath)?;

    let evicted = state
        .cache
        .revalidate(&path)
        .await
        .map_err(|e| RevalidateError::Internal(e.to_string()))?;
    info!("Revalidated {} ({} cached entries dropped)", path, evicted);

    Ok(Json(json!({
        "revalidated": true,
        "now": chrono::Utc::now().timestamp_millis(),
    })))
}

/// Revalidation errors
#[derive(Debug)]
pub enum RevalidateError {
    Unauthorized,
    MissingPath,
    Internal(String),
}

impl IntoResponse for RevalidateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            RevalidateError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            RevalidateError::MissingPath => {
                (StatusCode::BAD_REQUEST, "Missing path param".to_string())
            }
            RevalidateError::Internal(msg) => {
                error!("Revalidation error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}
