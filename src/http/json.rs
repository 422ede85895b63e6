//! JSON request decoding.
//!
//! # Responsibilities
//! - Read the body up to the configured size limit
//! - Decode exactly one JSON value, rejecting unknown keys (callers derive
//!   `#[serde(deny_unknown_fields)]` on input types)
//! - Turn decoder failures into client-facing 400 messages

use axum::{
    body::Body,
    extract::{FromRequest, Request},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::ApiError;
use crate::http::server::AppState;

/// Read `body` and decode it as `T`.
pub async fn read_json<T: DeserializeOwned>(body: Body, limit: usize) -> Result<T, ApiError> {
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            return Err(ApiError::BadRequest(format!(
                "body must not be larger than {limit} bytes"
            )));
        }
        Err(e) => return Err(ApiError::BadRequest(format!("failed to read body: {e}"))),
    };

    decode_json(&bytes)
}

/// Decode exactly one JSON value from `bytes`.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::BadRequest("body must not be empty".into()));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(describe)?;
    de.end().map_err(|_| {
        ApiError::BadRequest("body must only contain a single JSON value".into())
    })?;
    Ok(value)
}

fn describe(e: serde_json::Error) -> ApiError {
    let message = match e.classify() {
        Category::Syntax => format!(
            "body contains badly-formed JSON (at line {} column {})",
            e.line(),
            e.column()
        ),
        Category::Eof => "body contains badly-formed JSON".to_string(),
        Category::Data => describe_data_error(&e),
        Category::Io => format!("failed to read body: {e}"),
    };
    ApiError::BadRequest(message)
}

fn describe_data_error(e: &serde_json::Error) -> String {
    let full = e.to_string();
    // serde_json appends " at line L column C" to every message.
    let text = full
        .rfind(" at line ")
        .map_or(full.as_str(), |idx| &full[..idx]);

    if let Some(rest) = text.strip_prefix("unknown field `") {
        let key = rest.split('`').next().unwrap_or_default();
        return format!("body contains unknown key \"{key}\"");
    }
    if text.starts_with("invalid type") {
        return format!(
            "body contains incorrect JSON type (at line {} column {})",
            e.line(),
            e.column()
        );
    }
    text.to_string()
}

/// Extractor that decodes the request body with [`read_json`], using the
/// configured body limit.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let limit = state.config.security.max_body_size;
        read_json(req.into_body(), limit).await.map(JsonBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Input {
        name: String,
        count: Option<i32>,
    }

    fn message(result: Result<Input, ApiError>) -> String {
        match result {
            Err(ApiError::BadRequest(m)) => m,
            other => panic!("expected bad request, got {other:?}"),
        }
    }

    #[test]
    fn test_decodes_valid_body() {
        let input: Input = decode_json(br#"{"name": "x", "count": 2}"#).unwrap();
        assert_eq!(input.count, Some(2));
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(message(decode_json(b"")), "body must not be empty");
        assert_eq!(message(decode_json(b"  \n")), "body must not be empty");
    }

    #[test]
    fn test_badly_formed() {
        let m = message(decode_json(br#"{"name": "x",}"#));
        assert!(m.starts_with("body contains badly-formed JSON (at line 1"), "{m}");
        assert_eq!(
            message(decode_json(br#"{"name": "#)),
            "body contains badly-formed JSON"
        );
    }

    #[test]
    fn test_unknown_key() {
        assert_eq!(
            message(decode_json(br#"{"name": "x", "rating": 5}"#)),
            "body contains unknown key \"rating\""
        );
    }

    #[test]
    fn test_incorrect_type() {
        let m = message(decode_json(br#"{"name": 12}"#));
        assert!(m.starts_with("body contains incorrect JSON type"), "{m}");
    }

    #[test]
    fn test_multiple_values() {
        assert_eq!(
            message(decode_json(br#"{"name": "x"}{"name": "y"}"#)),
            "body must only contain a single JSON value"
        );
    }

    #[tokio::test]
    async fn test_size_limit() {
        let body = Body::from(format!(r#"{{"name": "{}"}}"#, "a".repeat(64)));
        let result: Result<Input, _> = read_json(body, 16).await;
        assert_eq!(message(result), "body must not be larger than 16 bytes");
    }
}
