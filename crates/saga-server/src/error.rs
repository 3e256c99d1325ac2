//! HTTP mapping for `SagaError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use saga_core::error::SagaError;

/// Route handler error. Wraps the shared error so it can become a response.
#[derive(Debug)]
pub struct ApiError(pub SagaError);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<SagaError> for ApiError {
    fn from(e: SagaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SagaError::BadRequest(_) | SagaError::UnsupportedVersion => StatusCode::BAD_REQUEST,
            SagaError::Unauthenticated => StatusCode::UNAUTHORIZED,
            SagaError::Forbidden(_) => StatusCode::FORBIDDEN,
            SagaError::NotFound(_) => StatusCode::NOT_FOUND,
            SagaError::Conflict(_) => StatusCode::CONFLICT,
            SagaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(json!({
            "error": self.0.client_code().as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
