use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Request-level failure taxonomy. Every variant carries a user-facing
/// message; storage and internal failures are logged server-side and shown to
/// the client as a generic message only.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("An account with this email already exists.")]
    DuplicateEmail,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Survey not found.")]
    NotFound,

    #[error("You are not allowed to perform this action.")]
    Forbidden,

    #[error("This survey is no longer available.")]
    Unavailable,

    #[error("You have already responded to this survey.")]
    AlreadyResponded,

    #[error("Please answer every question.")]
    IncompleteSubmission,

    #[error("An unexpected error occurred. Please try again.")]
    Persistence(#[from] sqlx::Error),

    #[error("An unexpected error occurred. Please try again.")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unavailable => StatusCode::GONE,
            AppError::AlreadyResponded => StatusCode::CONFLICT,
            AppError::IncompleteSubmission => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Persistence(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Persistence(e) => {
                tracing::error!("storage failure: {e}");
            }
            AppError::Internal(e) => {
                tracing::error!("internal failure: {e}");
            }
            _ => {}
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(
            AppError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Unavailable.status(), StatusCode::GONE);
        assert_eq!(AppError::AlreadyResponded.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::IncompleteSubmission.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn persistence_message_hides_detail() {
        let err = AppError::Persistence(sqlx::Error::PoolTimedOut);
        assert_eq!(
            err.to_string(),
            "An unexpected error occurred. Please try again."
        );
    }
}
