use axum::{extract::State, http::StatusCode, response::Response};
use serde_json::json;

use crate::http::response::write_json;
use crate::http::server::AppState;

/// `GET /v1/healthcheck`
pub async fn healthcheck(State(state): State<AppState>) -> Response {
    write_json(
        StatusCode::OK,
        &json!({
            "status": "available",
            "system_info": {
                "environment": state.config.environment,
                "version": env!("CARGO_PKG_VERSION"),
            }
        }),
    )
}
