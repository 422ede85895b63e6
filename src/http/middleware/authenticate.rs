//! Bearer-token authentication.
//!
//! # Responsibilities
//! - Parse `Authorization: Bearer <token>`
//! - Resolve the token to a user through the [`IdentityResolver`]
//! - Attach exactly one [`Identity`] to the request extensions
//!
//! # Design Decisions
//! - A missing header is not an error: the request continues anonymously
//!   and route authorization decides whether that is acceptable
//! - One lookup per request; a store failure is a 500, never a silent
//!   downgrade to anonymous

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::data::tokens::TOKEN_LENGTH;
use crate::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::identity::{Identity, LookupError};

/// What the `Authorization` header holds.
#[derive(Debug, PartialEq, Eq)]
pub enum Credential<'a> {
    Absent,
    Bearer(&'a str),
    Malformed,
}

/// Classify the `Authorization` header. Anything but exactly
/// `Bearer <26-char token>` is malformed.
pub fn bearer_token(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Credential::Absent;
    };
    let Ok(value) = value.to_str() else {
        return Credential::Malformed;
    };

    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if token.len() == TOKEN_LENGTH => {
            Credential::Bearer(token)
        }
        _ => Credential::Malformed,
    }
}

/// Authentication stage. Every response varies on `Authorization`.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let identity = match bearer_token(request.headers()) {
        Credential::Absent => Ok(Identity::Anonymous),
        Credential::Malformed => {
            metrics::record_auth_failure("malformed");
            Err(ApiError::Unauthenticated)
        }
        Credential::Bearer(token) => {
            match state.models.identities.resolve_identity_by_token(token).await {
                Ok(user) => Ok(Identity::User(Arc::new(user))),
                Err(LookupError::NotFound) => {
                    metrics::record_auth_failure("unknown_token");
                    Err(ApiError::Unauthenticated)
                }
                Err(LookupError::Expired) => {
                    metrics::record_auth_failure("expired_token");
                    Err(ApiError::Unauthenticated)
                }
                Err(LookupError::StoreUnavailable(detail)) => {
                    Err(ApiError::Internal(format!("identity lookup failed: {detail}")))
                }
            }
        }
    };

    let mut response = match identity {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}
