//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (enforce connect/response/idle deadlines)
//!     → On failure: surface the error to the caller, never retry
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No automatic retries; retry policy belongs to whoever sent the request

pub mod timeouts;

pub use timeouts::UpstreamTimeouts;
