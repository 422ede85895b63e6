//! Gatekeeping pipeline composition.
//!
//! # Data Flow
//! ```text
//! request
//!     → RecoverPanic (outermost: nothing below escapes it)
//!     → Cors         (preflights end here)
//!     → RateLimit    (429 before any credential work)
//!     → Authenticate (attach Identity)
//!     → route table  (per-route authorize, then handler)
//! ```
//!
//! # Design Decisions
//! - The order is a constant list, so it can be read and tested directly
//! - Stages are folded innermost-first, which leaves `ORDER[0]` outermost

use axum::{middleware::from_fn_with_state, Router};

use crate::http::middleware::{authenticate, recover_panic};
use crate::http::server::AppState;
use crate::security::cors::cors_middleware;
use crate::security::rate_limit::rate_limit_middleware;

/// A pipeline stage applied around the whole route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RecoverPanic,
    Cors,
    RateLimit,
    Authenticate,
}

impl Stage {
    /// Outermost first.
    pub const ORDER: [Stage; 4] = [
        Stage::RecoverPanic,
        Stage::Cors,
        Stage::RateLimit,
        Stage::Authenticate,
    ];

    fn apply(self, router: Router, state: &AppState) -> Router {
        let state = state.clone();
        match self {
            Stage::RecoverPanic => router.layer(from_fn_with_state(state, recover_panic)),
            Stage::Cors => router.layer(from_fn_with_state(state, cors_middleware)),
            Stage::RateLimit => router.layer(from_fn_with_state(state, rate_limit_middleware)),
            Stage::Authenticate => router.layer(from_fn_with_state(state, authenticate)),
        }
    }
}

/// Wrap `routes` in every stage of [`Stage::ORDER`].
pub fn compose(routes: Router, state: &AppState) -> Router {
    Stage::ORDER
        .iter()
        .rev()
        .fold(routes, |router, stage| stage.apply(router, state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_isolation_is_outermost() {
        assert_eq!(Stage::ORDER[0], Stage::RecoverPanic);
        assert_eq!(Stage::ORDER[Stage::ORDER.len() - 1], Stage::Authenticate);
    }

    #[test]
    fn test_rate_limit_precedes_authentication() {
        let position = |s| Stage::ORDER.iter().position(|x| *x == s);
        assert!(position(Stage::Cors) < position(Stage::RateLimit));
        assert!(position(Stage::RateLimit) < position(Stage::Authenticate));
    }
}
