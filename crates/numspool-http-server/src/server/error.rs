//! API error envelope.
//!
//! Maps engine and service failures onto the `{code, message}` JSON
//! envelope. User-actionable conditions (invalid filter, over capacity)
//! carry enough detail to adjust the request; environmental I/O failures
//! collapse into a single generic 500 since there is nothing the caller can
//! do about them.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::server::store::StoreError;

/// Service-level errors surfaced to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed filter input, rejected before the engine runs.
    InvalidFilter(String),
    /// The deduplicated result exceeded the generation ceiling.
    OverCapacity { limit: usize, actual: usize },
    /// Zero segments matched the filter.
    NoMatches,
    /// The requested spool file does not exist (or was swept).
    MissingFile(String),
    /// Login required or credentials rejected.
    Unauthorized,
    /// Environmental failure; details go to the log, not the client.
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidFilter(message) => (StatusCode::BAD_REQUEST, message),
            Self::OverCapacity { limit, actual } => (
                StatusCode::BAD_REQUEST,
                format!(
                    "result of {actual} numbers exceeds the limit of {limit}, narrow the filter"
                ),
            ),
            Self::NoMatches => (
                StatusCode::NOT_FOUND,
                "no numbers match the given filter".to_owned(),
            ),
            Self::MissingFile(name) => (
                StatusCode::NOT_FOUND,
                format!("file {name} does not exist or has expired"),
            ),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "login required".to_owned()),
            Self::Internal(e) => {
                tracing::error!("generation failed: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "generation failed".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            code: status.as_u16(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<numspool::Error> for ApiError {
    fn from(err: numspool::Error) -> Self {
        match err {
            numspool::Error::OverCapacity { limit, actual } => Self::OverCapacity { limit, actual },
            numspool::Error::ArtifactExpired { name } => Self::MissingFile(name),
            other => Self::Internal(other.into()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.into())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(err.into())
    }
}
