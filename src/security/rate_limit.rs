//! Per-client token-bucket rate limiting.
//!
//! # Responsibilities
//! - Admit or reject each request against the caller's token bucket
//! - Derive the client key from the connection (or trusted proxy headers)
//! - Evict buckets for clients that have gone quiet
//!
//! # Design Decisions
//! - Buckets live in a `DashMap`, so two clients never contend on one lock
//!   and the sweeper only blocks the shard it is visiting
//! - The bucket refills lazily on access; there is no per-client timer
//! - A disabled limiter admits immediately and tracks nothing
//! - Time comes from `tokio::time`, so the sweeper and bucket ages follow
//!   the runtime clock

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::config::LimiterConfig;
use crate::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// One client's allowance.
#[derive(Debug, Clone, Copy)]
struct TokenBucket {
    tokens: f64,
    last_seen: Instant,
}

impl TokenBucket {
    fn full(burst: f64, now: Instant) -> Self {
        Self {
            tokens: burst,
            last_seen: now,
        }
    }

    /// Refill for the time elapsed since the last access, then take one
    /// token. On failure returns how long until a token is available.
    fn try_acquire(&mut self, now: Instant, burst: f64, rate: f64) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_seen).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(burst);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = (1.0 - self.tokens) / rate;
            Err(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    Admitted,
    Rejected { retry_after: Duration },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Token buckets keyed by client.
pub struct ClientRateLimiter {
    clients: DashMap<String, TokenBucket>,
    enabled: bool,
    rate: f64,
    burst: f64,
    idle_timeout: Duration,
    sweep_interval: Duration,
}

impl ClientRateLimiter {
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            clients: DashMap::new(),
            enabled: config.enabled,
            rate: config.requests_per_second,
            burst: f64::from(config.burst),
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn check(&self, client: &str) -> Admission {
        self.check_at(client, Instant::now())
    }

    /// Check `client` as of `now`. Only the caller's entry is locked.
    pub fn check_at(&self, client: &str, now: Instant) -> Admission {
        if !self.enabled {
            return Admission::Admitted;
        }

        let outcome = match self.clients.get_mut(client) {
            Some(mut bucket) => bucket.try_acquire(now, self.burst, self.rate),
            None => self
                .clients
                .entry(client.to_string())
                .or_insert_with(|| TokenBucket::full(self.burst, now))
                .try_acquire(now, self.burst, self.rate),
        };

        match outcome {
            Ok(()) => Admission::Admitted,
            Err(retry_after) => Admission::Rejected { retry_after },
        }
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drop clients not seen within the idle timeout. Returns how many
    /// were evicted.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.clients.len();
        self.clients
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < self.idle_timeout);
        before.saturating_sub(self.clients.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    /// Run the idle sweep on a fixed interval until `shutdown` fires.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<tokio::task::JoinHandle<()>> {
        if !self.enabled {
            return None;
        }

        let period = self.sweep_interval;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = self.sweep();
                        let remaining = self.tracked_clients();
                        metrics::record_limiter_clients(remaining);
                        if evicted > 0 {
                            tracing::debug!(evicted, remaining, "Swept idle rate limiter clients");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate limiter sweeper stopping");
                        break;
                    }
                }
            }
        }))
    }
}

/// Key identifying the caller. Forwarding headers are honored only when
/// the deployment sits behind a trusted proxy.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim);
        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim);

        if let Some(ip) = forwarded
            .into_iter()
            .chain(real_ip)
            .find_map(|candidate| candidate.parse::<IpAddr>().ok())
        {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Rejects requests from clients whose bucket is empty.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.limiter.is_enabled() {
        return next.run(request).await;
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(
        request.headers(),
        peer,
        state.config.limiter.trust_proxy_headers,
    );

    match state.limiter.check(&key) {
        Admission::Admitted => next.run(request).await,
        Admission::Rejected { retry_after } => {
            tracing::warn!(client = %key, "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited {
                retry_after: Some(retry_after),
            }
            .into_response()
        }
    }
}
