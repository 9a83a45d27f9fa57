use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uci_bridge::SupervisorError;

use crate::types::ErrorResponse;

/// ハンドラのエラー。`{ "error": ... }` の JSON で返す。
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Engine(#[from] SupervisorError),

    #[error("search task failed: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Engine(SupervisorError::InvalidBudget) => StatusCode::BAD_REQUEST,
            ApiError::Engine(
                SupervisorError::Busy
                | SupervisorError::ProcessTerminated
                | SupervisorError::Unavailable(_),
            ) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Engine(SupervisorError::Io(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("request failed: {self}");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
