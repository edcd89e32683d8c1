//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Interceptor and server produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line of a request via its span
//! - Metrics are cheap (no-op without an installed recorder)

pub mod logging;
pub mod metrics;
