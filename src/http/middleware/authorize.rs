//! Per-route permission checks.
//!
//! The decision runs in three steps: an identity must be present, the
//! account must be activated, and its permission set must contain the
//! route's code. Membership is exact.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::routing::PermissionRequirement;
use crate::security::identity::Identity;

/// Decide whether `identity` may use a route guarded by `required`.
/// A missing identity is treated as anonymous.
pub fn check_permission(
    identity: Option<&Identity>,
    required: PermissionRequirement,
) -> Result<(), ApiError> {
    // 1. Authenticated?
    let user = identity
        .and_then(Identity::user)
        .ok_or(ApiError::AuthenticationRequired)?;

    // 2. Activated?
    if !user.activated {
        return Err(ApiError::AccountNotActivated);
    }

    // 3. Permitted?
    if !user.permissions.includes(required.code()) {
        tracing::debug!(
            user_id = user.id,
            permission = required.code(),
            "Permission denied"
        );
        return Err(ApiError::InsufficientPermission);
    }

    Ok(())
}

/// Authorization stage, attached with `route_layer` to guarded routes only.
pub async fn authorize(
    State(required): State<PermissionRequirement>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match check_permission(request.extensions().get::<Identity>(), required) {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}
