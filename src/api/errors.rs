use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::error::{EngineError, EngineOpError};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

/// Domain rejections become 4xx responses; persistence failures stay 500s
/// and are never dressed up as user errors.
impl From<EngineOpError> for ApiError {
    fn from(err: EngineOpError) -> Self {
        match err {
            EngineOpError::Domain(domain) => domain.into(),
            EngineOpError::NotFound(entity) => Self::NotFound(format!("{entity} not found")),
            EngineOpError::Db(db) => Self::internal(db, "Persistence failure"),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidAnswerShape(_) => Self::BadRequest(err.to_string()),
            EngineError::InvalidTransition { .. }
            | EngineError::InvalidEffectiveDate(_)
            | EngineError::IncompleteGrading { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::TooManyRequests(message) => {
                let status = StatusCode::TOO_MANY_REQUESTS;
                (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lifecycle::AssignmentStatus;

    #[test]
    fn transition_conflicts_map_to_409() {
        let err: ApiError = EngineError::InvalidTransition {
            from: AssignmentStatus::Submitted,
            action: "submit",
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn shape_errors_map_to_400() {
        let err: ApiError = EngineError::InvalidAnswerShape("bad".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn missing_entities_map_to_404() {
        let err: ApiError = EngineOpError::NotFound("assignment").into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
