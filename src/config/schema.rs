//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Operating environment reported by the healthcheck
    /// (`development`, `staging` or `production`).
    pub environment: String,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-client rate limiting.
    pub limiter: LimiterConfig,

    /// Cross-origin request policy.
    pub cors: CorsConfig,

    /// Token lifetimes and password hashing cost.
    pub auth: AuthConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            limiter: LimiterConfig::default(),
            cors: CorsConfig::default(),
            auth: AuthConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for a request/response cycle, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Token-bucket rate limiting, one bucket per client address.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Enable rate limiting. When disabled no bucket state is kept.
    pub enabled: bool,

    /// Refill rate in tokens per second.
    pub requests_per_second: f64,

    /// Bucket capacity.
    pub burst: u32,

    /// Buckets unseen for longer than this are evicted.
    pub idle_timeout_secs: u64,

    /// How often the eviction sweep runs.
    pub sweep_interval_secs: u64,

    /// Key clients by `X-Forwarded-For` / `X-Real-IP` instead of the socket
    /// address. Only safe behind a trusted reverse proxy.
    pub trust_proxy_headers: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2.0,
            burst: 4,
            idle_timeout_secs: 180,
            sweep_interval_secs: 60,
            trust_proxy_headers: false,
        }
    }
}

/// Trusted origins for cross-origin requests. Matching is exact.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    pub trusted_origins: Vec<String>,
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of activation tokens issued at registration.
    pub activation_token_ttl_secs: u64,

    /// Lifetime of bearer tokens issued by `/v1/tokens/authentication`.
    pub authentication_token_ttl_secs: u64,

    /// Argon2id memory cost in KiB.
    pub argon2_memory_kib: u32,

    /// Argon2id iteration count.
    pub argon2_iterations: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            activation_token_ttl_secs: 3 * 24 * 60 * 60,
            authentication_token_ttl_secs: 24 * 60 * 60,
            argon2_memory_kib: 19 * 1024,
            argon2_iterations: 2,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum JSON request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1_048_576, // 1MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log line format.
    pub log_format: LogFormat,

    /// Serve Prometheus metrics on a separate listener.
    pub metrics_enabled: bool,

    /// Address of the metrics listener.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}
