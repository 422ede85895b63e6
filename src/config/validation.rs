//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates > 0, TTLs bounded, addresses parse)
//! - Reject wildcard origins; the CORS allow-list is exact-match only
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;

const ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key, e.g. `limiter.burst`.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Check every semantic constraint and report all violations at once.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !ENVIRONMENTS.contains(&config.environment.as_str()) {
        errors.push(ValidationError::new(
            "environment",
            format!("must be one of {}", ENVIRONMENTS.join(", ")),
        ));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    let limiter = &config.limiter;
    if limiter.enabled {
        if !(limiter.requests_per_second.is_finite() && limiter.requests_per_second > 0.0) {
            errors.push(ValidationError::new(
                "limiter.requests_per_second",
                "must be a positive number",
            ));
        }
        if limiter.burst == 0 {
            errors.push(ValidationError::new("limiter.burst", "must be at least 1"));
        }
        if limiter.idle_timeout_secs == 0 {
            errors.push(ValidationError::new("limiter.idle_timeout_secs", "must be greater than zero"));
        }
        if limiter.sweep_interval_secs == 0 {
            errors.push(ValidationError::new("limiter.sweep_interval_secs", "must be greater than zero"));
        }
    }

    for origin in &config.cors.trusted_origins {
        if origin.is_empty() {
            errors.push(ValidationError::new("cors.trusted_origins", "must not contain empty entries"));
        } else if origin.contains('*') {
            errors.push(ValidationError::new(
                "cors.trusted_origins",
                format!("{origin:?} contains a wildcard; origins are matched exactly"),
            ));
        }
    }

    for (field, ttl) in [
        ("auth.activation_token_ttl_secs", config.auth.activation_token_ttl_secs),
        ("auth.authentication_token_ttl_secs", config.auth.authentication_token_ttl_secs),
    ] {
        if ttl == 0 || ttl > MAX_TOKEN_TTL_SECS {
            errors.push(ValidationError::new(
                field,
                format!("must be between 1 and {MAX_TOKEN_TTL_SECS} seconds"),
            ));
        }
    }

    if config.auth.argon2_memory_kib < 8 {
        errors.push(ValidationError::new("auth.argon2_memory_kib", "must be at least 8"));
    }
    if config.auth.argon2_iterations == 0 {
        errors.push(ValidationError::new("auth.argon2_iterations", "must be at least 1"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.environment = "qa".into();
        config.limiter.burst = 0;
        config.limiter.requests_per_second = f64::NAN;
        config.cors.trusted_origins = vec!["https://*.example.com".into()];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "environment",
                "limiter.requests_per_second",
                "limiter.burst",
                "cors.trusted_origins",
            ]
        );
    }

    #[test]
    fn test_disabled_limiter_skips_rate_checks() {
        let mut config = AppConfig::default();
        config.limiter.enabled = false;
        config.limiter.burst = 0;
        config.limiter.requests_per_second = 0.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_token_ttl_bounds() {
        let mut config = AppConfig::default();
        config.auth.authentication_token_ttl_secs = 0;
        config.auth.activation_token_ttl_secs = MAX_TOKEN_TTL_SECS + 1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
