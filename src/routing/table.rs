//! The route table.
//!
//! # Responsibilities
//! - Register every API route with its method handlers
//! - Attach a [`PermissionRequirement`] to guarded routes
//! - Install the JSON 404/405 fallbacks
//!
//! # Design Decisions
//! - Requirements are fixed at registration and never change at runtime
//! - Authorization is a `route_layer`, so unmatched paths still get 404
//!   instead of 401

use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::{get, post, put, MethodRouter},
    Router,
};

use crate::error::ApiError;
use crate::handlers;
use crate::http::middleware::authorize;
use crate::http::server::AppState;

/// A capability code required by a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionRequirement(&'static str);

impl PermissionRequirement {
    pub const MOVIES_READ: Self = Self("movies:read");
    pub const MOVIES_WRITE: Self = Self("movies:write");

    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn code(&self) -> &'static str {
        self.0
    }
}

struct Route {
    path: &'static str,
    methods: MethodRouter<AppState>,
    required: Option<PermissionRequirement>,
}

/// Ordered list of routes. Registering the same path twice merges the
/// method handlers.
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route anyone may call.
    pub fn public(mut self, path: &'static str, methods: MethodRouter<AppState>) -> Self {
        self.routes.push(Route {
            path,
            methods,
            required: None,
        });
        self
    }

    /// Register a route that needs an activated user holding `required`.
    pub fn guarded(
        mut self,
        path: &'static str,
        required: PermissionRequirement,
        methods: MethodRouter<AppState>,
    ) -> Self {
        self.routes.push(Route {
            path,
            methods,
            required: Some(required),
        });
        self
    }

    /// The API's routes.
    pub fn standard() -> Self {
        use PermissionRequirement as P;

        Self::new()
            .public("/v1/healthcheck", get(handlers::healthcheck::healthcheck))
            .guarded("/v1/movies", P::MOVIES_READ, get(handlers::movies::list_movies))
            .guarded("/v1/movies", P::MOVIES_WRITE, post(handlers::movies::create_movie))
            .guarded("/v1/movies/{id}", P::MOVIES_READ, get(handlers::movies::show_movie))
            .guarded(
                "/v1/movies/{id}",
                P::MOVIES_WRITE,
                axum::routing::patch(handlers::movies::update_movie)
                    .delete(handlers::movies::delete_movie),
            )
            .public("/v1/users", post(handlers::users::register_user))
            .public("/v1/users/activated", put(handlers::users::activate_user))
            .public(
                "/v1/tokens/authentication",
                post(handlers::tokens::create_authentication_token),
            )
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build the router, bound to `state`.
    pub fn into_router(self, state: &AppState) -> Router {
        let router = self.routes.into_iter().fold(Router::new(), |router, route| {
            let methods = match route.required {
                Some(required) => route
                    .methods
                    .route_layer(from_fn_with_state(required, authorize)),
                None => route.methods,
            };
            router.route(route.path, methods)
        });

        router
            .fallback(not_found)
            .method_not_allowed_fallback(method_not_allowed)
            .with_state(state.clone())
    }
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
