//! API error taxonomy.
//!
//! Every gatekeeping stage and handler reports failure as an [`ApiError`].
//! Each variant maps to a fixed status code and a stable message that API
//! consumers can branch on. Internal faults are logged in full and answered
//! with a generic body.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::data::DataError;
use crate::http::response::{error_response, server_error_response};

/// Application-level error type that implements [`IntoResponse`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client's token bucket is empty (429).
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Option<Duration> },

    /// Malformed, unknown or expired bearer credential (401).
    #[error("invalid or missing authentication token")]
    Unauthenticated,

    /// Anonymous request to a route that needs an identity (401).
    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    /// Authenticated account has not been activated yet (403).
    #[error("your user account must be activated to access this resource")]
    AccountNotActivated,

    /// Activated account lacks the route's permission code (403).
    #[error("your user account doesn't have the necessary permissions to access this resource")]
    InsufficientPermission,

    /// Email/password pair did not match (401).
    #[error("invalid authentication credentials")]
    InvalidCredentials,

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    /// Undecodable request body or query (400).
    #[error("{0}")]
    BadRequest(String),

    /// Field-level validation failures (422).
    #[error("failed validation")]
    Validation(BTreeMap<String, String>),

    /// Handler did not finish within the request timeout (408).
    #[error("the server took too long to process your request")]
    Timeout,

    /// Optimistic concurrency check failed (409).
    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    /// Collaborator failure or other unexpected condition (500).
    #[error("internal fault: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }

    /// Build a 422 error carrying a single field message.
    pub fn field(key: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(key.to_string(), message.to_string());
        Self::Validation(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthenticated
            | Self::AuthenticationRequired
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AccountNotActivated | Self::InsufficientPermission => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::EditConflict => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        match e {
            DataError::NotFound => Self::NotFound,
            DataError::EditConflict => Self::EditConflict,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                server_error_response()
            }
            Self::Validation(errors) => error_response(status, errors),
            Self::Unauthenticated => {
                let mut response = error_response(status, self.to_string());
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            Self::RateLimited { retry_after } => {
                let mut response = error_response(status, self.to_string());
                if let Some(wait) = retry_after {
                    let secs = wait.as_secs_f64().ceil().max(1.0) as u64;
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
                response
            }
            other => error_response(status, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = ApiError::internal("connection pool exhausted").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "the server encountered a problem and could not process your request"
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_sets_challenge() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_rate_limited_rounds_retry_after_up() {
        let response = ApiError::RateLimited {
            retry_after: Some(Duration::from_millis(1200)),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
        let body = body_json(response).await;
        assert_eq!(body["error"], "rate limit exceeded");
    }

    #[tokio::test]
    async fn test_unbounded_retry_after_saturates() {
        let response = ApiError::RateLimited {
            retry_after: Some(Duration::MAX),
        }
        .into_response();
        assert_eq!(
            response.headers()[header::RETRY_AFTER],
            u64::MAX.to_string().as_str()
        );
    }

    #[tokio::test]
    async fn test_validation_error_is_object() {
        let body = body_json(ApiError::field("email", "must be provided").into_response()).await;
        assert_eq!(body, serde_json::json!({"error": {"email": "must be provided"}}));
    }

    #[test]
    fn test_data_errors_map_to_statuses() {
        assert_eq!(ApiError::from(DataError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(DataError::EditConflict).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::from(DataError::StoreUnavailable("down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
