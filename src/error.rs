use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::listing::ListingStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Invalid listing data: {0}")]
    Validation(String),

    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Invalid listing state: {0}")]
    InvalidState(String),

    #[error("Invalid status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ListingStatus,
        to: ListingStatus,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl MatchError {
    /// Stable machine-readable code used in HTTP error bodies
    pub fn code(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation_error",
            MatchError::NotFound(_) => "not_found",
            MatchError::InvalidState(_) => "invalid_state",
            MatchError::InvalidTransition { .. } => "invalid_transition",
            MatchError::Conflict(_) => "conflict",
            MatchError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for MatchError {
    fn status_code(&self) -> StatusCode {
        match self {
            MatchError::Validation(_) => StatusCode::BAD_REQUEST,
            MatchError::NotFound(_) => StatusCode::NOT_FOUND,
            MatchError::InvalidState(_)
            | MatchError::InvalidTransition { .. }
            | MatchError::Conflict(_) => StatusCode::CONFLICT,
            MatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            MatchError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.code(),
            "message": message
        }))
    }
}
