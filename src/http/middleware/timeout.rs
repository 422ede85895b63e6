//! Request deadline.
//!
//! Bounds the time a handler may take. An expired request is answered with
//! the shared error envelope; the handler future is dropped.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::http::server::AppState;

pub async fn request_timeout(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limit = Duration::from_secs(state.config.timeouts.request_secs);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%method, %path, timeout_secs = limit.as_secs(), "Request timed out");
            ApiError::Timeout.into_response()
        }
    }
}
