use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

/// Failures surfaced by the use cases and the store.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Caller-supplied field missing or invalid. Raised before any store access.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist; the payload names the entity kind.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique email or title already taken.
    #[error("{0}")]
    ConstraintViolation(String),

    /// Course already linked to the student.
    #[error("{0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn already_assigned(course_id: Uuid, student_id: Uuid) -> Self {
        Self::Conflict(format!(
            "course {} is already assigned to student {}",
            course_id, student_id
        ))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ConstraintViolation(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, "store failure");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
