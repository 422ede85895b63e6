//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use marquee::config::AppConfig;
use marquee::data::{Models, Scope, User};
use marquee::routing::RouteTable;
use marquee::{AppState, HttpServer};

pub const TRUSTED_ORIGIN: &str = "https://trusted.example.com";

/// Defaults with a cheap password hash, the limiter off and one trusted
/// origin.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.argon2_memory_kib = 64;
    config.auth.argon2_iterations = 1;
    config.limiter.enabled = false;
    config.cors.trusted_origins = vec![TRUSTED_ORIGIN.to_string()];
    config
}

pub fn test_state(config: AppConfig) -> AppState {
    AppState::new(config, Models::in_memory()).unwrap()
}

/// Router and state for the standard API.
pub fn test_app(config: AppConfig) -> (Router, AppState) {
    test_app_with_routes(test_state(config), RouteTable::standard())
}

pub fn test_app_with_routes(state: AppState, table: RouteTable) -> (Router, AppState) {
    let server = HttpServer::with_routes(state, table);
    (server.router(), server.state().clone())
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    request
}

/// Make the request appear to come from `ip`.
pub fn from_client(mut request: Request<Body>, ip: &str) -> Request<Body> {
    let addr: SocketAddr = format!("{ip}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

/// Store a user directly and return an authentication token for it.
pub async fn create_user_with_token(
    state: &AppState,
    email: &str,
    activated: bool,
    permissions: &[&str],
) -> String {
    let models = &state.models;
    let mut user = models
        .users
        .insert(User::new("Test User".into(), email.into(), String::new()))
        .await
        .unwrap();

    if activated {
        user.activated = true;
        user = models.users.update(user).await.unwrap();
    }
    if !permissions.is_empty() {
        models.permissions.add_for_user(user.id, permissions).await.unwrap();
    }

    models
        .tokens
        .new_token(user.id, Duration::hours(1), Scope::Authentication)
        .await
        .unwrap()
        .plaintext
}

/// Register through the API and return the new user's id.
pub async fn register(router: &Router, name: &str, email: &str, password: &str) -> i64 {
    let body = serde_json::json!({"name": name, "email": email, "password": password});
    let response = send(
        router,
        json_request(Method::POST, "/v1/users", &body.to_string()),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["user"]["id"].as_i64().unwrap()
}
