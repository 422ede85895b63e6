use axum::{extract::State, http::StatusCode, response::Response};
use chrono::Duration;
use serde::Deserialize;

use crate::data::users::{validate_email, validate_password_plaintext};
use crate::data::{DataError, Scope};
use crate::error::ApiError;
use crate::http::json::JsonBody;
use crate::http::response::{envelope, write_json};
use crate::http::server::AppState;
use crate::validator::Validator;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsInput {
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "Password")]
    pub password: String,
}

/// `POST /v1/tokens/authentication`
///
/// Unknown email and wrong password produce the same 401.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CredentialsInput>,
) -> Result<Response, ApiError> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    if !v.valid() {
        return Err(ApiError::Validation(v.into_errors()));
    }

    let user = match state.models.users.get_by_email(&input.email).await {
        Ok(user) => user,
        Err(DataError::NotFound) => return Err(ApiError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    let matches = state
        .passwords
        .verify(&input.password, &user.password_hash)
        .await
        .map_err(ApiError::internal)?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let ttl = Duration::seconds(state.config.auth.authentication_token_ttl_secs as i64);
    let token = state
        .models
        .tokens
        .new_token(user.id, ttl, Scope::Authentication)
        .await?;

    Ok(write_json(
        StatusCode::CREATED,
        &envelope("authentication_token", &token),
    ))
}
