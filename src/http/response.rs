//! JSON response writing.
//!
//! # Responsibilities
//! - Serialize handler payloads as indented JSON with a trailing newline
//! - Wrap payloads in a named envelope (`{"movie": ...}`)
//! - Produce the shared error envelope `{"error": <message-or-object>}`
//!
//! # Design Decisions
//! - Every gatekeeping stage and handler emits errors through this module so
//!   clients see one error shape
//! - A serialization failure degrades to a fixed 500 body instead of panicking

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Message returned for any internal fault. Details stay in the server log.
pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

const FALLBACK_BODY: &str =
    "{\n\t\"error\": \"the server encountered a problem and could not process your request\"\n}\n";

/// Build a `{"<key>": value}` envelope.
pub fn envelope(key: &str, value: impl Serialize) -> Value {
    let mut map = Map::new();
    map.insert(
        key.to_string(),
        serde_json::to_value(value).unwrap_or(Value::Null),
    );
    Value::Object(map)
}

/// Write `body` as JSON with the given status code.
pub fn write_json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec_pretty(body) {
        Ok(mut bytes) => {
            bytes.push(b'\n');
            json_response(status, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            json_response(StatusCode::INTERNAL_SERVER_ERROR, Body::from(FALLBACK_BODY))
        }
    }
}

/// Write the shared error envelope.
pub fn error_response(status: StatusCode, message: impl Serialize) -> Response {
    write_json(status, &envelope("error", message))
}

/// Generic 500 response. Callers are responsible for logging the cause.
pub fn server_error_response() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE)
}

fn json_response(status: StatusCode, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
