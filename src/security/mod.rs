//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (negotiate origin, answer preflights)
//!     → rate_limit.rs (per-client token bucket)
//!     → http::middleware::authenticate (bearer token → identity.rs)
//!     → http::middleware::authorize (permission code, per route)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a lookup failure is a 500, never an anonymous fallback
//! - Secrets are never stored in plaintext: passwords as Argon2id hashes,
//!   tokens as SHA-256 digests

pub mod cors;
pub mod identity;
pub mod password;
pub mod rate_limit;

pub use cors::CorsPolicy;
pub use identity::{AuthenticatedUser, Identity, IdentityResolver, LookupError};
pub use password::{PasswordError, Passwords};
pub use rate_limit::{Admission, ClientRateLimiter};
