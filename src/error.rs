//! Domain error type for the match engine, mapped to HTTP status codes at
//! the boundary. The core always returns one of these variants, never an
//! ambiguous internal error for an expected condition.

use actix_web::{http::StatusCode, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("{0}")]
    BadRequest(String),

    #[error("match {0} not found")]
    NotFound(String),

    #[error("question {0} not found")]
    UnknownQuestion(String),

    #[error("match {0} already exists")]
    Conflict(String),

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("insufficient permissions")]
    Unauthorized,

    #[error("authentication service unavailable")]
    ServiceUnavailable,

    #[error("{0}")]
    Internal(String),
}

impl MatchError {
    /// Time-gate errors must read "Try again at <ISO8601>".
    pub fn try_again_at(when: DateTime<Utc>) -> Self {
        Self::BadRequest(format!("Try again at {}", when.to_rfc3339()))
    }

    pub fn not_ready(send_at: DateTime<Utc>) -> Self {
        Self::try_again_at(send_at)
    }

    pub fn too_early(send_at: DateTime<Utc>) -> Self {
        Self::try_again_at(send_at)
    }

    pub fn not_yet_verified(available_at: DateTime<Utc>) -> Self {
        Self::try_again_at(available_at)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl actix_web::error::ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::BadRequest(_) | MatchError::Conflict(_) => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) | MatchError::UnknownQuestion(_) => StatusCode::NOT_FOUND,
            MatchError::Unauthenticated => StatusCode::UNAUTHORIZED,
            MatchError::Unauthorized => StatusCode::FORBIDDEN,
            MatchError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            MatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
