//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     RouteTable::standard()
//!     → public / guarded entries (path, methods, permission)
//!     → into_router (authorize route layers, 404/405 fallbacks)
//!     → Freeze as immutable axum Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route

pub mod table;

pub use table::{PermissionRequirement, RouteTable};
