/**
 * API Errors
 * Error taxonomy shared by every handler and the JSON body extractor.
 */
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Request, State,
    },
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Error body returned by every failing endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{field} already exists")]
    Duplicate { field: String },

    /// Rewritten to a 400 with a size hint by [`payload_too_large`].
    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("{message}")]
    Internal {
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    details: Some(details),
                    ..ErrorResponse::new(message)
                }),
            )
                .into_response(),
            ApiError::Duplicate { field } => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    field: Some(field),
                    ..ErrorResponse::new(message)
                }),
            )
                .into_response(),
            ApiError::PayloadTooLarge => {
                (StatusCode::PAYLOAD_TOO_LARGE, Json(ErrorResponse::new(message))).into_response()
            }
            ApiError::Internal { detail, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    stack: detail,
                    ..ErrorResponse::new(message)
                }),
            )
                .into_response(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::Validation(vec![rejection.body_text()])
        }
    }
}

/// `Json` extractor whose rejections use the API error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(vec![rejection.body_text()])
    }
}

/// `Query` extractor whose rejections use the API error shape.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Turn any 413 (from the body limit layer or the extractor) into a 400 that
/// tells the client the maximum size.
pub async fn payload_too_large(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }

    let max = state.config.max_body_bytes;
    tracing::warn!(max_bytes = max, "Rejected oversized request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            details: Some(vec![format!(
                "Maximum request size is {} bytes ({} MB)",
                max,
                max / (1024 * 1024)
            )]),
            ..ErrorResponse::new("Request body too large")
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_shape() {
        let (status, body) = body_of(ApiError::not_found("Portfolio not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Portfolio not found");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn test_validation_lists_details() {
        let err = ApiError::Validation(vec!["name is required".into(), "email is invalid".into()]);
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "Validation failed");
        assert_eq!(body.details.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_field() {
        let (status, body) = body_of(ApiError::Duplicate {
            field: "email".into(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "email already exists");
        assert_eq!(body.field.as_deref(), Some("email"));
    }

    #[tokio::test]
    async fn test_internal_includes_stack_only_when_present() {
        let (status, body) = body_of(ApiError::Internal {
            message: "Failed".into(),
            detail: None,
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.stack.is_none());

        let (_, body) = body_of(ApiError::Internal {
            message: "Failed".into(),
            detail: Some("Io(..)".into()),
        })
        .await;
        assert_eq!(body.stack.as_deref(), Some("Io(..)"));
    }
}
