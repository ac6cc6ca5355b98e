use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::{CoreError, ErrorKind, FieldError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

/// HTTP status for each core error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden | ErrorKind::NotParticipant => StatusCode::FORBIDDEN,
        ErrorKind::Conflict | ErrorKind::CapacityExceeded => StatusCode::CONFLICT,
        ErrorKind::InvalidLocation | ErrorKind::NotParticipating | ErrorKind::Validation => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn internal_body(msg: &str) -> (StatusCode, ErrorBody) {
    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody {
            error: "internal_error".into(),
            message: "An internal error occurred".into(),
            details: None,
        },
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Core(err) if err.kind == ErrorKind::Internal => internal_body(&err.message),
            ApiError::Core(err) => (
                status_for(err.kind),
                ErrorBody {
                    error: err.kind.code().into(),
                    message: err.message,
                    details: (!err.details.is_empty()).then_some(err.details),
                },
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: "unauthorized".into(),
                    message: msg,
                    details: None,
                },
            ),
            ApiError::Internal(msg) => internal_body(&msg),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: "service_unavailable".into(),
                    message: msg,
                    details: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Core(errors.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::NotParticipant), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::CapacityExceeded), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::InvalidLocation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::NotParticipating), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_capacity_exceeded_body() {
        let response = ApiError::from(CoreError::capacity_exceeded()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"], "capacity_exceeded");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_details_are_exposed() {
        let err = CoreError::invalid_field("max_distance", "Distance out of range");
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["details"][0]["field"], "max_distance");
    }

    #[tokio::test]
    async fn test_internal_message_is_hidden() {
        let response =
            ApiError::from(CoreError::internal("connection refused to 10.0.0.3")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[test]
    fn test_unauthorized_status() {
        let response = ApiError::Unauthorized("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
