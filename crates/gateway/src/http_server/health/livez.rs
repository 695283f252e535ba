use axum::response::{IntoResponse, Response};
use axum::Json;
use axum::http::StatusCode;

/// The process is up and serving requests
#[tracing::instrument]
pub async fn handler() -> Response {
    let msg = serde_json::json!({"status": "ok"});
    (StatusCode::OK, Json(msg)).into_response()
}
