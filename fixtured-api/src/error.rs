use crate::response::Envelope;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use fixtured_core::error::FixtureError;
use thiserror::Error;
use tracing::{error, warn};

/// Failure of a request, rendered as a failure envelope
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("{0}")]
    Locked(String),

    #[error("{0}")]
    UpstreamFailure(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Locked(_) => StatusCode::LOCKED,
            ApiError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn missing(param: &str) -> Self {
        ApiError::InvalidInput(format!("missing parameter: {param}"))
    }
}

impl From<FixtureError> for ApiError {
    fn from(err: FixtureError) -> Self {
        match err {
            FixtureError::NotFound(msg) => ApiError::NotFound(msg),
            FixtureError::InvalidInput(msg) => ApiError::InvalidInput(msg),
            FixtureError::Locked(msg) => ApiError::Locked(msg),
            FixtureError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            other => ApiError::UpstreamFailure(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::UpstreamFailure(msg) => error!("request failed: {}", msg),
            other => warn!("request rejected ({}): {}", status.as_u16(), other),
        }

        let mut response = Envelope::failure(status, self.to_string()).into_response();
        if matches!(self, ApiError::Unauthorized(_)) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Basic realm=\"fixtured\""),
            );
        }
        response
    }
}
