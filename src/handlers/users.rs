//! Registration and activation.

use axum::{extract::State, http::StatusCode, response::Response};
use chrono::Duration;
use serde::Deserialize;

use crate::data::tokens::validate_token_plaintext;
use crate::data::users::validate_registration;
use crate::data::{DataError, Scope, User};
use crate::error::ApiError;
use crate::http::json::JsonBody;
use crate::http::response::{envelope, write_json};
use crate::http::server::AppState;
use crate::routing::PermissionRequirement;
use crate::validator::Validator;

/// Title-case keys (`"Name"`) are accepted alongside the lowercase ones.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterInput {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "Password")]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivateInput {
    #[serde(alias = "Token")]
    pub token: String,
}

/// `POST /v1/users`
///
/// New accounts start unactivated with `movies:read`. The activation token
/// is issued here; delivering it to the user is left to the deployment.
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    validate_registration(&mut v, &input.name, &input.email, &input.password);
    if !v.valid() {
        return Err(ApiError::Validation(v.into_errors()));
    }

    let password_hash = state
        .passwords
        .hash(&input.password)
        .await
        .map_err(ApiError::internal)?;

    let user = match state
        .models
        .users
        .insert(User::new(input.name, input.email, password_hash))
        .await
    {
        Ok(user) => user,
        Err(DataError::DuplicateEmail) => {
            return Err(ApiError::field(
                "email",
                "a user with this email address already exists",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    state
        .models
        .permissions
        .add_for_user(user.id, &[PermissionRequirement::MOVIES_READ.code()])
        .await?;

    let ttl = Duration::seconds(state.config.auth.activation_token_ttl_secs as i64);
    let token = state
        .models
        .tokens
        .new_token(user.id, ttl, Scope::Activation)
        .await?;
    tracing::info!(user_id = user.id, expiry = %token.expiry, "User registered");

    Ok(write_json(StatusCode::CREATED, &envelope("user", &user)))
}

/// `PUT /v1/users/activated`
pub async fn activate_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ActivateInput>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    if !v.valid() {
        return Err(ApiError::Validation(v.into_errors()));
    }

    let mut user = match state
        .models
        .users
        .get_for_token(Scope::Activation, &input.token)
        .await
    {
        Ok(user) => user,
        Err(DataError::NotFound) => {
            return Err(ApiError::field(
                "token",
                "invalid or expired activation token",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    user.activated = true;
    let user = state.models.users.update(user).await?;

    state
        .models
        .tokens
        .delete_all_for_user(Scope::Activation, user.id)
        .await?;
    tracing::info!(user_id = user.id, "User activated");

    Ok(write_json(StatusCode::OK, &envelope("user", &user)))
}
