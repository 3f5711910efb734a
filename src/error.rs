use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Every failure the aggregation core can surface to a request.
///
/// Payloads are plain strings so one error can be handed to every caller
/// waiting on the same coalesced cache fill.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// Bad or missing input: empty city, non-numeric coordinate, non-positive page.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Non-2xx response, timeout, transport failure or a body missing expected fields.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Malformed numeric field in an otherwise well-formed upstream body.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Durable tier connection or query failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidQuery(_) => "invalid_query",
            AppError::Upstream(_) => "upstream",
            AppError::Parse(_) => "parse",
            AppError::Store(_) => "store",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Upstream(format!("request timed out: {}", err))
        } else if err.is_decode() {
            AppError::Upstream(format!("malformed response body: {}", err))
        } else {
            AppError::Upstream(format!("HTTP request failed: {}", err))
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "request failed: {}", self);
        } else {
            tracing::debug!(kind = self.kind(), "rejected request: {}", self);
        }

        let body = ErrorBody {
            error: true,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
