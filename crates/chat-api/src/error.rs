use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use chat_core::ChatError;

use crate::response::ApiResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Chat(e) => match e {
                ChatError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
                ChatError::ConversationNotFound(_) => {
                    (StatusCode::NOT_FOUND, "CONVERSATION_NOT_FOUND")
                }
                ChatError::ModelUnavailable(_) => (StatusCode::NOT_FOUND, "MODEL_UNAVAILABLE"),
                ChatError::NotImplemented(_) => (StatusCode::NOT_IMPLEMENTED, "NOT_IMPLEMENTED"),
                ChatError::InvocationFailure { .. } => {
                    (StatusCode::BAD_GATEWAY, "INVOCATION_FAILURE")
                }
                ChatError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
                ChatError::StoreFailure { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "STORE_FAILURE")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}: {}", code, self);
        } else {
            tracing::warn!("{}: {}", code, self);
        }

        let message_id = match &self {
            ApiError::Chat(e) => e.message_id(),
            ApiError::Validation(_) => None,
        };

        let body = Json(ApiResponse::<()>::error(code, &self.to_string(), message_id));
        (status, body).into_response()
    }
}
