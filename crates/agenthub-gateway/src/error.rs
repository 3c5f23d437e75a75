use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use agenthub_core::error::HubError;

/// Error surface of the HTTP boundary. Every failure renders as
/// `{"detail": <message>}` with an appropriate status; no internals
/// leak past the error message.
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    pub fn mission_not_found() -> Self {
        Self::not_found("Mission not found")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<HubError> for ApiError {
    fn from(err: HubError) -> Self {
        let status = match &err {
            HubError::Validation(_) => StatusCode::BAD_REQUEST,
            HubError::MissionNotFound(_) => StatusCode::NOT_FOUND,
            HubError::InvalidMissionState { .. } | HubError::AgentNotRegistered(_) => {
                StatusCode::CONFLICT
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let detail = match &err {
            HubError::MissionNotFound(_) => "Mission not found".to_string(),
            _ => err.to_string(),
        };
        Self::new(status, detail)
    }
}
