use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use crate::errors::EngineError;

pub type ApiError = (StatusCode, Json<Value>);

pub fn error_response(err: &EngineError) -> ApiError {
    let status = match err {
        EngineError::Config(_) => StatusCode::BAD_REQUEST,
        EngineError::Authentication(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()})))
}

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({"error": message.into()})))
}

pub fn unavailable(message: &str) -> ApiError {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"error": message})))
}

impl IntoResponse for EngineError {
    fn into_response(self) -> axum::response::Response {
        error_response(&self).into_response()
    }
}
