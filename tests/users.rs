//! Registration, activation and token issuance.

use axum::http::{Method, StatusCode};
use chrono::Duration;
use serde_json::json;

use marquee::data::Scope;

mod common;

use common::*;

#[tokio::test]
async fn test_register_user_scenarios() {
    let (router, _) = test_app(test_config());

    struct Case {
        name: &'static str,
        body: String,
        status: StatusCode,
        error_field: Option<&'static str>,
    }

    let cases = [
        Case {
            name: "empty name",
            body: json!({"name": "", "email": "ada@example.com", "password": "pa55word-long"})
                .to_string(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error_field: Some("name"),
        },
        Case {
            name: "invalid email",
            body: json!({"name": "Ada", "email": "not@valid.", "password": "pa55word-long"})
                .to_string(),
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error_field: Some("email"),
        },
        Case {
            name: "corrupted json",
            body: r#"{"name": "Ada", "email": "#.to_string(),
            status: StatusCode::BAD_REQUEST,
            error_field: None,
        },
        Case {
            name: "valid",
            body: json!({"name": "Ada", "email": "ada@example.com", "password": "pa55word-long"})
                .to_string(),
            status: StatusCode::CREATED,
            error_field: None,
        },
    ];

    for case in cases {
        let response = send(&router, json_request(Method::POST, "/v1/users", &case.body)).await;
        assert_eq!(response.status(), case.status, "{}", case.name);

        let body = body_json(response).await;
        if let Some(field) = case.error_field {
            assert!(body["error"][field].is_string(), "{}: {body}", case.name);
        }
    }
}

#[tokio::test]
async fn test_register_accepts_title_case_keys() {
    let (router, _) = test_app(test_config());

    let body = r#"{"Name": "Ada", "Email": "ada@example.com", "Password": "pa55word-long"}"#;
    let response = send(&router, json_request(Method::POST, "/v1/users", body)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["user"]["email"], "ada@example.com");

    let body = r#"{"Name": "", "Email": "not@valid.", "Password": "pa55word-long"}"#;
    let response = send(&router, json_request(Method::POST, "/v1/users", body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let errors = body_json(response).await["error"].clone();
    assert!(errors["name"].is_string());
    assert!(errors["email"].is_string());

    let login = r#"{"Email": "ada@example.com", "Password": "pa55word-long"}"#;
    let response = send(
        &router,
        json_request(Method::POST, "/v1/tokens/authentication", login),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_registered_user_shape() {
    let (router, state) = test_app(test_config());
    let body = json!({"name": "Ada", "email": "ada@example.com", "password": "pa55word-long"});
    let response = send(
        &router,
        json_request(Method::POST, "/v1/users", &body.to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let user = body_json(response).await["user"].clone();
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["activated"], false);
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());

    let id = user["id"].as_i64().unwrap();
    let permissions = state.models.permissions.get_all_for_user(id).await.unwrap();
    assert!(permissions.includes("movies:read"));
    assert!(!permissions.includes("movies:write"));
}

#[tokio::test]
async fn test_duplicate_email_is_422() {
    let (router, _) = test_app(test_config());
    register(&router, "Ada", "ada@example.com", "pa55word-long").await;

    let body = json!({"name": "Other", "email": "ada@example.com", "password": "another-pass"});
    let response = send(
        &router,
        json_request(Method::POST, "/v1/users", &body.to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["email"],
        "a user with this email address already exists"
    );
}

#[tokio::test]
async fn test_unknown_key_is_400() {
    let (router, _) = test_app(test_config());
    let body = r#"{"name": "Ada", "email": "ada@example.com", "password": "pa55word-long", "admin": true}"#;
    let response = send(&router, json_request(Method::POST, "/v1/users", body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "body contains unknown key \"admin\""
    );
}

#[tokio::test]
async fn test_oversized_body_is_400() {
    let mut config = test_config();
    config.security.max_body_size = 64;
    let (router, _) = test_app(config);

    let body = json!({"name": "A".repeat(200), "email": "ada@example.com", "password": "pa55word-long"});
    let response = send(
        &router,
        json_request(Method::POST, "/v1/users", &body.to_string()),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "body must not be larger than 64 bytes"
    );
}

#[tokio::test]
async fn test_activation_flow() {
    let (router, state) = test_app(test_config());
    let id = register(&router, "Ada", "ada@example.com", "pa55word-long").await;

    let token = state
        .models
        .tokens
        .new_token(id, Duration::hours(1), Scope::Activation)
        .await
        .unwrap();
    let body = json!({"token": token.plaintext}).to_string();

    let response = send(&router, json_request(Method::PUT, "/v1/users/activated", &body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["activated"], true);

    // Activation tokens are single use.
    let response = send(&router, json_request(Method::PUT, "/v1/users/activated", &body)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body_json(response).await["error"]["token"],
        "invalid or expired activation token"
    );
}

#[tokio::test]
async fn test_activation_token_format() {
    let (router, _) = test_app(test_config());
    let response = send(
        &router,
        json_request(Method::PUT, "/v1/users/activated", r#"{"token": "short"}"#),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["token"], "must be 26 bytes long");
}

#[tokio::test]
async fn test_authentication_token_issuance() {
    let (router, _) = test_app(test_config());
    register(&router, "Ada", "ada@example.com", "pa55word-long").await;

    let login = |password: &str| {
        json_request(
            Method::POST,
            "/v1/tokens/authentication",
            &json!({"email": "ada@example.com", "password": password}).to_string(),
        )
    };

    let response = send(&router, login("pa55word-long")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let token = body["authentication_token"]["token"].as_str().unwrap();
    assert_eq!(token.len(), 26);
    assert!(body["authentication_token"]["expiry"].is_string());

    let response = send(&router, login("wrong-password")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "invalid authentication credentials"
    );

    let unknown = json_request(
        Method::POST,
        "/v1/tokens/authentication",
        &json!({"email": "nobody@example.com", "password": "pa55word-long"}).to_string(),
    );
    let response = send(&router, unknown).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_activate_login_then_read_movies() {
    let (router, state) = test_app(test_config());
    let id = register(&router, "Ada", "ada@example.com", "pa55word-long").await;

    let login = || {
        json_request(
            Method::POST,
            "/v1/tokens/authentication",
            &json!({"email": "ada@example.com", "password": "pa55word-long"}).to_string(),
        )
    };

    // Before activation the token authenticates but the account is gated.
    let body = body_json(send(&router, login()).await).await;
    let token = body["authentication_token"]["token"].as_str().unwrap().to_string();
    let response = send(&router, with_bearer(get("/v1/movies"), &token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let activation = state
        .models
        .tokens
        .new_token(id, Duration::hours(1), Scope::Activation)
        .await
        .unwrap();
    let response = send(
        &router,
        json_request(
            Method::PUT,
            "/v1/users/activated",
            &json!({"token": activation.plaintext}).to_string(),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&router, with_bearer(get("/v1/movies"), &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["movies"], json!([]));
    assert_eq!(body["metadata"], json!({}));
}
