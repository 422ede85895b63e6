//! User accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::data::{DataError, Scope};
use crate::validator::{email_regex, matches, Validator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    /// Argon2id PHC string.
    #[serde(skip)]
    pub password_hash: String,
    pub activated: bool,
    #[serde(skip)]
    pub version: i32,
}

impl User {
    /// A not-yet-stored, unactivated account.
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: 0,
            created_at: Utc::now(),
            name,
            email,
            password_hash,
            activated: false,
            version: 0,
        }
    }
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(matches(email, email_regex()), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(password.len() <= 72, "password", "must not be more than 72 bytes long");
}

/// Checks applied to registration input before the password is hashed.
pub fn validate_registration(v: &mut Validator, name: &str, email: &str, password: &str) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(name.len() <= 500, "name", "must not be more than 500 bytes long");
    validate_email(v, email);
    validate_password_plaintext(v, password);
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Store a new user. Fails with [`DataError::DuplicateEmail`] when the
    /// address is taken.
    async fn insert(&self, user: User) -> Result<User, DataError>;

    async fn get_by_email(&self, email: &str) -> Result<User, DataError>;

    /// Replace a user, checking `user.version` against the stored record.
    async fn update(&self, user: User) -> Result<User, DataError>;

    /// The owner of an unexpired token with the given scope.
    async fn get_for_token(&self, scope: Scope, plaintext: &str) -> Result<User, DataError>;
}
