//! Request identity and the token lookup seam used by authentication.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::data::Permissions;

/// A user whose bearer token has been verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub activated: bool,
    pub permissions: Permissions,
}

/// Who is making the request. Attached to request extensions by the
/// authentication stage and read-only from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No credential was supplied.
    Anonymous,
    User(Arc<AuthenticatedUser>),
}

impl Identity {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Identity::Anonymous => None,
            Identity::User(user) => Some(user),
        }
    }
}

/// Why a token could not be resolved to a user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no user holds this token")]
    NotFound,

    #[error("token has expired")]
    Expired,

    #[error("identity store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Resolves a bearer token plaintext to the user it was issued to.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity_by_token(
        &self,
        plaintext: &str,
    ) -> Result<AuthenticatedUser, LookupError>;
}
