//! Route handlers.
//!
//! Handlers only run after the gatekeeping pipeline has admitted the
//! request. Every response body is a named JSON envelope.

pub mod healthcheck;
pub mod movies;
pub mod tokens;
pub mod users;

use std::collections::HashMap;

use crate::error::ApiError;
use crate::validator::Validator;

/// Parse a positive resource id. Anything else is a 404.
pub fn read_id(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

pub fn read_string(query: &HashMap<String, String>, key: &str, default: &str) -> String {
    query
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Comma-separated list; empty entries are dropped.
pub fn read_csv(query: &HashMap<String, String>, key: &str) -> Vec<String> {
    query
        .get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Integer parameter. A value that does not parse is recorded against
/// `key` and `default` is returned.
pub fn read_int(
    query: &HashMap<String, String>,
    key: &str,
    default: u64,
    v: &mut Validator,
) -> u64 {
    match query.get(key).filter(|s| !s.is_empty()) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}
