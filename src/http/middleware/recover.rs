//! Panic isolation.
//!
//! # Responsibilities
//! - Catch a panic raised while the inner stages or the handler produce a
//!   response
//! - Answer with the generic 500 envelope and `Connection: close`
//! - Report the fault with the request's correlation ID
//!
//! # Design Decisions
//! - Only the response-producing future is guarded. Once a response is
//!   returned its body is streamed by the server; a fault there ends that
//!   connection only
//! - The server task keeps running; other connections never observe the
//!   fault

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::http::request::CorrelationId;
use crate::http::response::server_error_response;
use crate::http::server::AppState;
use crate::observability::{metrics, RequestMetadata};

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Outermost pipeline stage.
pub async fn recover_panic(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let correlation_id = CorrelationId::from_headers(request.headers());
    let metadata = RequestMetadata {
        method: request.method().clone(),
        uri: request.uri().clone(),
        client: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string()),
    };

    let response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            state
                .faults
                .report_fault(correlation_id.as_str(), &error, &metadata);
            metrics::record_panic();

            let mut response = server_error_response();
            response
                .headers_mut()
                .insert(header::CONNECTION, HeaderValue::from_static("close"));
            response
        }
    };

    metrics::record_request(metadata.method.as_str(), response.status().as_u16(), start);
    response
}
