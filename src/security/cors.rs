//! CORS origin negotiation.
//!
//! Only origins on the configured allow-list (exact match) receive CORS
//! headers. Preflights from a trusted origin are answered here and never
//! reach routing or any later stage. Requests from other origins pass
//! through untouched; the browser enforces the missing header.

use std::collections::HashSet;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

const PREFLIGHT_METHODS: &str = "OPTIONS, PUT, PATCH, DELETE";
const PREFLIGHT_HEADERS: &str = "Authorization, Content-Type";

/// Trusted origins, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    trusted: HashSet<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            trusted: origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_trusted(&self, origin: &str) -> bool {
        self.trusted.contains(origin)
    }

    pub fn is_empty(&self) -> bool {
        self.trusted.is_empty()
    }
}

fn is_preflight(request: &Request<Body>) -> bool {
    request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

fn add_vary(response: &mut Response) {
    let headers = response.headers_mut();
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    headers.append(
        header::VARY,
        HeaderValue::from_static("Access-Control-Request-Method"),
    );
}

/// CORS stage.
pub async fn cors_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .filter(|value| {
            value
                .to_str()
                .map(|origin| state.cors.is_trusted(origin))
                .unwrap_or(false)
        })
        .cloned();

    let Some(origin) = origin else {
        let mut response = next.run(request).await;
        add_vary(&mut response);
        return response;
    };

    if is_preflight(&request) {
        tracing::debug!(origin = ?origin, "Answering CORS preflight");
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        let headers = response.headers_mut();
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(PREFLIGHT_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(PREFLIGHT_HEADERS),
        );
        add_vary(&mut response);
        return response;
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    add_vary(&mut response);
    response
}
