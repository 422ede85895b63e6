//! Movie resource tests through the full router.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};

mod common;

use common::*;

async fn writer_app() -> (Router, String) {
    let (router, state) = test_app(test_config());
    let token = create_user_with_token(
        &state,
        "writer@example.com",
        true,
        &["movies:read", "movies:write"],
    )
    .await;
    (router, token)
}

async fn create(router: &Router, token: &str, movie: Value) -> Value {
    let request = json_request(Method::POST, "/v1/movies", &movie.to_string());
    let response = send(router, with_bearer(request, token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["movie"].clone()
}

fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    with_bearer(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
        token,
    )
}

#[tokio::test]
async fn test_create_and_show() {
    let (router, token) = writer_app().await;

    let request = json_request(
        Method::POST,
        "/v1/movies",
        &json!({"title": "Casablanca", "year": 1942, "runtime": "102 mins", "genres": ["drama", "romance"]})
            .to_string(),
    );
    let response = send(&router, with_bearer(request, &token)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[header::LOCATION], "/v1/movies/1");

    let movie = body_json(response).await["movie"].clone();
    assert_eq!(movie["id"], 1);
    assert_eq!(movie["runtime"], "102 mins");
    assert_eq!(movie["version"], 1);

    let response = send(&router, authed(Method::GET, "/v1/movies/1", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["movie"]["title"], "Casablanca");
}

#[tokio::test]
async fn test_show_missing_or_invalid_id() {
    let (router, token) = writer_app().await;
    for uri in ["/v1/movies/99", "/v1/movies/abc", "/v1/movies/0"] {
        let response = send(&router, authed(Method::GET, uri, &token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_create_validation() {
    let (router, token) = writer_app().await;
    let request = json_request(
        Method::POST,
        "/v1/movies",
        &json!({"title": "", "year": 1700, "genres": ["a", "a"]}).to_string(),
    );
    let response = send(&router, with_bearer(request, &token)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let errors = body_json(response).await["error"].clone();
    assert_eq!(errors["title"], "must be provided");
    assert_eq!(errors["year"], "must be greater than 1888");
    assert_eq!(errors["runtime"], "must be provided");
    assert_eq!(errors["genres"], "must not contain duplicate values");
}

#[tokio::test]
async fn test_update_with_version_check() {
    let (router, token) = writer_app().await;
    create(
        &router,
        &token,
        json!({"title": "Black Panther", "year": 2018, "runtime": "134 mins", "genres": ["action"]}),
    )
    .await;

    let mut stale = json_request(Method::PATCH, "/v1/movies/1", r#"{"year": 2017}"#);
    stale
        .headers_mut()
        .insert("x-expected-version", "7".parse().unwrap());
    let response = send(&router, with_bearer(stale, &token)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let mut current = json_request(Method::PATCH, "/v1/movies/1", r#"{"runtime": "135 mins"}"#);
    current
        .headers_mut()
        .insert("x-expected-version", "1".parse().unwrap());
    let response = send(&router, with_bearer(current, &token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let movie = body_json(response).await["movie"].clone();
    assert_eq!(movie["runtime"], "135 mins");
    assert_eq!(movie["year"], 2018);
    assert_eq!(movie["version"], 2);
}

#[tokio::test]
async fn test_delete() {
    let (router, token) = writer_app().await;
    create(
        &router,
        &token,
        json!({"title": "Deadpool", "year": 2016, "runtime": "108 mins", "genres": ["action", "comedy"]}),
    )
    .await;

    let response = send(&router, authed(Method::DELETE, "/v1/movies/1", &token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "movie successfully deleted"
    );

    let response = send(&router, authed(Method::DELETE, "/v1/movies/1", &token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters_sorting_and_metadata() {
    let (router, token) = writer_app().await;
    for movie in [
        json!({"title": "The Breakfast Club", "year": 1985, "runtime": "96 mins", "genres": ["comedy", "drama"]}),
        json!({"title": "Black Panther", "year": 2018, "runtime": "134 mins", "genres": ["action", "adventure"]}),
        json!({"title": "Deadpool", "year": 2016, "runtime": "108 mins", "genres": ["action", "comedy"]}),
    ] {
        create(&router, &token, movie).await;
    }

    let response = send(
        &router,
        authed(Method::GET, "/v1/movies?sort=-year&page_size=2", &token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let titles: Vec<_> = body["movies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Black Panther", "Deadpool"]);
    assert_eq!(
        body["metadata"],
        json!({"current_page": 1, "page_size": 2, "first_page": 1, "last_page": 2, "total_records": 3})
    );

    let response = send(
        &router,
        authed(Method::GET, "/v1/movies?genres=action,comedy", &token),
    )
    .await;
    let body = body_json(response).await;
    assert_eq!(body["movies"].as_array().unwrap().len(), 1);
    assert_eq!(body["movies"][0]["title"], "Deadpool");
}

#[tokio::test]
async fn test_list_rejects_bad_filters() {
    let (router, token) = writer_app().await;
    let response = send(
        &router,
        authed(Method::GET, "/v1/movies?sort=rating&page=0&page_size=x", &token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let errors = body_json(response).await["error"].clone();
    assert_eq!(errors["sort"], "invalid sort value");
    assert_eq!(errors["page"], "must be greater than zero");
    assert_eq!(errors["page_size"], "must be an integer value");
}
