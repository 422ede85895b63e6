//! Marquee: a movie catalogue JSON API behind a gatekeeping pipeline.

pub mod config;
pub mod data;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod validator;

pub use config::AppConfig;
pub use error::ApiError;
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
