//! Gatekeeping middleware.
//!
//! Each stage is a handle-or-delegate function: it either writes a terminal
//! response or calls `next`. Ordering lives in [`crate::http::pipeline`].

pub mod authenticate;
pub mod authorize;
pub mod recover;
pub mod timeout;

pub use authenticate::authenticate;
pub use authorize::{authorize, check_permission};
pub use recover::recover_panic;
pub use timeout::request_timeout;
