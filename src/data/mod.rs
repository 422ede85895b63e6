//! Data-access layer.
//!
//! # Responsibilities
//! - Define the records served by the API (movies, users, tokens, permissions)
//! - Declare the store traits handlers and middleware depend on
//! - Bundle store handles into [`Models`] for the application state
//!
//! # Design Decisions
//! - Stores are async traits so a networked backend can replace the bundled
//!   in-memory one without touching callers
//! - One [`MemoryStore`] implements every trait; tests swap individual
//!   handles to inject failures

pub mod filters;
pub mod memory;
pub mod movies;
pub mod permissions;
pub mod tokens;
pub mod users;

use std::sync::Arc;

use thiserror::Error;

use crate::security::identity::IdentityResolver;

pub use filters::{Filters, Metadata};
pub use memory::MemoryStore;
pub use movies::{Movie, MovieStore, Runtime};
pub use permissions::{PermissionStore, Permissions};
pub use tokens::{Scope, Token, TokenStore};
pub use users::{User, UserStore};

/// Errors raised by store implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("record not found")]
    NotFound,

    /// The record changed since the caller read it.
    #[error("edit conflict")]
    EditConflict,

    #[error("duplicate email")]
    DuplicateEmail,

    /// The backing store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Handles to every store, cloned into the application state.
#[derive(Clone)]
pub struct Models {
    pub movies: Arc<dyn MovieStore>,
    pub users: Arc<dyn UserStore>,
    pub tokens: Arc<dyn TokenStore>,
    pub permissions: Arc<dyn PermissionStore>,
    pub identities: Arc<dyn IdentityResolver>,
}

impl Models {
    /// All stores backed by a single shared in-memory store.
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    pub fn from_store(store: Arc<MemoryStore>) -> Self {
        Self {
            movies: store.clone(),
            users: store.clone(),
            tokens: store.clone(),
            permissions: store.clone(),
            identities: store,
        }
    }
}
