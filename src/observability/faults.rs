//! Fault reporting for requests that failed unexpectedly.

use axum::http::{Method, Uri};

/// What is known about the request that faulted.
#[derive(Debug, Clone)]
pub struct RequestMetadata {
    pub method: Method,
    pub uri: Uri,
    pub client: Option<String>,
}

/// Sink for faults caught by panic isolation.
pub trait FaultReporter: Send + Sync {
    fn report_fault(&self, correlation_id: &str, error: &str, request: &RequestMetadata);
}

/// Reports faults as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFaultReporter;

impl FaultReporter for TracingFaultReporter {
    fn report_fault(&self, correlation_id: &str, error: &str, request: &RequestMetadata) {
        tracing::error!(
            correlation_id = %correlation_id,
            method = %request.method,
            uri = %request.uri,
            client = request.client.as_deref().unwrap_or("unknown"),
            error = %error,
            "Request handler panicked"
        );
    }
}
