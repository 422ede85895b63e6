//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → command-line overrides (main.rs), validated again
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the CORS allow-list and limiter
//!   settings never change while the server runs
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, AuthConfig, CorsConfig, LimiterConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, SecurityConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
