//! Movie CRUD handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::Response,
};
use serde::Deserialize;
use serde_json::json;

use crate::data::filters::validate_filters;
use crate::data::movies::{validate_movie, MOVIE_SORT_SAFELIST};
use crate::data::{Filters, Movie, Runtime};
use crate::error::ApiError;
use crate::handlers::{read_csv, read_id, read_int, read_string};
use crate::http::json::JsonBody;
use crate::http::response::{envelope, write_json};
use crate::http::server::AppState;
use crate::validator::Validator;

const X_EXPECTED_VERSION: &str = "x-expected-version";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateMovieInput {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpdateMovieInput {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
}

/// `POST /v1/movies`
pub async fn create_movie(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateMovieInput>,
) -> Result<Response, ApiError> {
    let movie = Movie::new(input.title, input.year, input.runtime, input.genres);

    let mut v = Validator::new();
    validate_movie(&mut v, &movie);
    if !v.valid() {
        return Err(ApiError::Validation(v.into_errors()));
    }

    let movie = state.models.movies.insert(movie).await?;
    tracing::info!(movie_id = movie.id, "Movie created");

    let mut response = write_json(StatusCode::CREATED, &envelope("movie", &movie));
    let location = HeaderValue::try_from(format!("/v1/movies/{}", movie.id))
        .map_err(ApiError::internal)?;
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}

/// `GET /v1/movies/{id}`
pub async fn show_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = read_id(&id)?;
    let movie = state.models.movies.get(id).await?;
    Ok(write_json(StatusCode::OK, &envelope("movie", &movie)))
}

/// `PATCH /v1/movies/{id}`
///
/// An `X-Expected-Version` header makes the update conditional on the
/// stored version.
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(input): JsonBody<UpdateMovieInput>,
) -> Result<Response, ApiError> {
    let id = read_id(&id)?;
    let mut movie = state.models.movies.get(id).await?;

    if let Some(expected) = headers.get(X_EXPECTED_VERSION) {
        if expected.as_bytes() != movie.version.to_string().as_bytes() {
            return Err(ApiError::EditConflict);
        }
    }

    if let Some(title) = input.title {
        movie.title = title;
    }
    if let Some(year) = input.year {
        movie.year = year;
    }
    if let Some(runtime) = input.runtime {
        movie.runtime = runtime;
    }
    if let Some(genres) = input.genres {
        movie.genres = genres;
    }

    let mut v = Validator::new();
    validate_movie(&mut v, &movie);
    if !v.valid() {
        return Err(ApiError::Validation(v.into_errors()));
    }

    let movie = state.models.movies.update(movie).await?;
    Ok(write_json(StatusCode::OK, &envelope("movie", &movie)))
}

/// `DELETE /v1/movies/{id}`
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = read_id(&id)?;
    state.models.movies.delete(id).await?;
    Ok(write_json(
        StatusCode::OK,
        &json!({"message": "movie successfully deleted"}),
    ))
}

/// `GET /v1/movies?title=&genres=&page=&page_size=&sort=`
pub async fn list_movies(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let Query(query) = Query::<HashMap<String, String>>::try_from_uri(&uri)
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let mut v = Validator::new();
    let title = read_string(&query, "title", "");
    let genres = read_csv(&query, "genres");
    let filters = Filters {
        page: read_int(&query, "page", 1, &mut v),
        page_size: read_int(&query, "page_size", 20, &mut v),
        sort: read_string(&query, "sort", "id"),
        sort_safelist: MOVIE_SORT_SAFELIST,
    };

    validate_filters(&mut v, &filters);
    if !v.valid() {
        return Err(ApiError::Validation(v.into_errors()));
    }

    let (movies, metadata) = state.models.movies.get_all(&title, &genres, &filters).await?;
    Ok(write_json(
        StatusCode::OK,
        &json!({"movies": movies, "metadata": metadata}),
    ))
}
