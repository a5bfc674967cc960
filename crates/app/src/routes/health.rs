use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
    });
    (StatusCode::OK, Json(body))
}
