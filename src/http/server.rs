//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared [`AppState`] from configuration and stores
//! - Assemble the router: route table, gatekeeping pipeline, request IDs,
//!   tracing and the request deadline
//! - Serve until shutdown, then stop background tasks
//!
//! # Layer order (outermost first)
//! ```text
//! SetRequestId → Trace → PropagateRequestId
//!     → pipeline (RecoverPanic → Cors → RateLimit → Authenticate)
//!     → request deadline → route table (authorize) → handler
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::data::Models;
use crate::http::middleware::request_timeout;
use crate::http::pipeline::compose;
use crate::observability::{FaultReporter, TracingFaultReporter};
use crate::routing::RouteTable;
use crate::security::{ClientRateLimiter, CorsPolicy, PasswordError, Passwords};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub models: Models,
    pub limiter: Arc<ClientRateLimiter>,
    pub cors: Arc<CorsPolicy>,
    pub faults: Arc<dyn FaultReporter>,
    pub passwords: Passwords,
}

impl AppState {
    pub fn new(config: AppConfig, models: Models) -> Result<Self, PasswordError> {
        let passwords = Passwords::new(config.auth.argon2_memory_kib, config.auth.argon2_iterations)?;
        let limiter = Arc::new(ClientRateLimiter::new(&config.limiter));
        let cors = Arc::new(CorsPolicy::new(config.cors.trusted_origins.iter().cloned()));

        Ok(Self {
            config: Arc::new(config),
            models,
            limiter,
            cors,
            faults: Arc::new(TracingFaultReporter),
            passwords,
        })
    }

    /// Replace the fault sink.
    pub fn with_fault_reporter(mut self, faults: Arc<dyn FaultReporter>) -> Self {
        self.faults = faults;
        self
    }
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Server exposing the standard route table.
    pub fn new(state: AppState) -> Self {
        Self::with_routes(state, RouteTable::standard())
    }

    pub fn with_routes(state: AppState, table: RouteTable) -> Self {
        let router = Self::build_router(&state, table);
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: &AppState, table: RouteTable) -> Router {
        let routes = table
            .into_router(state)
            .layer(from_fn_with_state(state.clone(), request_timeout));

        compose(routes, state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router. Cheap to clone.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests and stop the limiter sweeper.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.state.config.environment,
            limiter_enabled = self.state.limiter.is_enabled(),
            "HTTP server starting"
        );

        let sweeper = self
            .state
            .limiter
            .clone()
            .spawn_sweeper(shutdown.resubscribe());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        if let Some(sweeper) = sweeper {
            if let Err(e) = sweeper.await {
                tracing::warn!(error = %e, "Rate limiter sweeper ended abnormally");
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
