//! HTTP rendering of [`ExternalError`]

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hacrud_application::{ExternalError, ExternalErrorKind};

/// Wrapper that renders an [`ExternalError`] as `{code, message, fields?}`
/// with the status from the error taxonomy.
#[derive(Debug)]
pub struct ApiError(pub ExternalError);

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self(ExternalError::new(
            ExternalErrorKind::Unauthorized,
            "Missing or invalid bearer token",
        ))
    }
}

impl From<ExternalError> for ApiError {
    fn from(err: ExternalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}
