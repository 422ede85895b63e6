//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → faults.rs (panics caught by the pipeline, with correlation IDs)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through logs and fault reports
//! - Metrics are cheap (atomic increments)

pub mod faults;
pub mod logging;
pub mod metrics;

pub use faults::{FaultReporter, RequestMetadata, TracingFaultReporter};
