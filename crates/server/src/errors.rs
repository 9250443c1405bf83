use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::StoreError;
use thiserror::Error;
use tracing::{error, warn};

/// Request-level failure; wraps the store error so every handler maps
/// failures to HTTP the same way.
#[derive(Debug)]
pub struct ApiError(pub StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self { Self(e) }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            StoreError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            StoreError::AlreadyExists(_) => StatusCode::CONFLICT,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::InvalidCredential => StatusCode::UNAUTHORIZED,
            StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let err = self.0;
        if err.is_client_error() {
            warn!(error = %err, code = err.code(), "request rejected");
        } else {
            error!(error = %err, code = err.code(), "storage failure");
        }
        let body = ErrorBody { error: err.kind().to_string(), code: err.code(), message: err.to_string() };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage unavailable: {0}")]
    Storage(String),
    #[error("cannot bind {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
