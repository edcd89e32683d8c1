//! Timeout enforcement.
//!
//! # Responsibilities
//! - Bound upstream connect, response head and body idle time
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Timed-out requests return 504 Gateway Timeout
//! - A body idle timeout aborts the stream; bytes already sent stay sent

use std::time::Duration;

use crate::config::TimeoutConfig;

/// Deadlines applied to every upstream exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamTimeouts {
    /// TCP connect to the upstream.
    pub connect: Duration,
    /// Until the upstream response head arrives.
    pub response: Duration,
    /// Maximum silence between body chunks.
    pub idle: Duration,
    /// Idle pooled connections are closed after this.
    pub pool_idle: Duration,
}

impl From<&TimeoutConfig> for UpstreamTimeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_secs(config.connect_secs),
            response: Duration::from_secs(config.request_secs),
            idle: Duration::from_secs(config.idle_secs),
            pool_idle: Duration::from_secs(config.pool_idle_secs),
        }
    }
}

impl Default for UpstreamTimeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}
