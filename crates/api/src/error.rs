//! JSON error responses.

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domain::uploads::FILE_TOO_LARGE;
use domain::FeedxError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] FeedxError),

    /// No `Authorization: Bearer` header on a protected route.
    #[error("No token provided")]
    MissingToken,

    /// The request could not be decoded (malformed JSON, broken multipart).
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Service(err) => match err {
                FeedxError::NotFound { .. } => StatusCode::NOT_FOUND,
                FeedxError::Validation(_)
                | FeedxError::Conflict(_)
                | FeedxError::InvalidTransition { .. }
                | FeedxError::EscalationNotAllowed(_) => StatusCode::BAD_REQUEST,
                FeedxError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
                FeedxError::Forbidden(_) => StatusCode::FORBIDDEN,
                FeedxError::Storage(_) | FeedxError::Configuration(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return FeedxError::validation(FILE_TOO_LARGE).into();
        }
        ApiError::BadRequest(format!("Upload error: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            error!(error = %self, "request failed");
            INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::IssueStatus;

    #[test]
    fn workflow_refusals_are_bad_requests() {
        let err: ApiError = FeedxError::InvalidTransition {
            from: IssueStatus::Rejected,
            to: IssueStatus::Open,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err: ApiError = FeedxError::EscalationNotAllowed("too early".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(ApiError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        let err: ApiError = FeedxError::forbidden("Admin access required").into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn storage_failures_are_500() {
        let err: ApiError = FeedxError::Storage("disk full".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
