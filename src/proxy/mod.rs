//! Proxy forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Request seen by the dev server
//!     → intercept.rs (rule lookup; no match → next handler)
//!     → headers.rs (drop hop-by-hop headers, rewrite Host)
//!     → forward.rs (pooled client, timeouts)
//!     → upstream response streamed back unchanged
//!     → on failure: error.rs (502 / 504, JSON body)
//! ```

pub mod error;
pub mod forward;
pub mod headers;
pub mod intercept;

pub use error::ProxyError;
pub use forward::Forwarder;
pub use intercept::{intercept, ProxyState};
