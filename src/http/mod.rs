//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request IDs, tracing)
//!     → pipeline.rs (panic isolation, CORS, rate limit, authentication)
//!     → routing::table (authorization, handler dispatch)
//!     → json.rs (request body decoding)
//!     → response.rs (JSON envelopes)
//!     → Send to client
//! ```

pub mod json;
pub mod middleware;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::{compose, Stage};
pub use request::{CorrelationId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
