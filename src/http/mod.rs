//! HTTP protocol handling subsystem (the dev server host).
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, HTTP/1.1 + HTTP/2)
//!     → request.rs (request ID, tracing span)
//!     → proxy interceptor (rule match → upstream)
//!     → otherwise: static bundle or 404
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
