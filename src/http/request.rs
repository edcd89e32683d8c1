//! Request identification.
//!
//! # Responsibilities
//! - Tag every inbound request with a unique ID (UUID v4)
//! - Reuse a caller-supplied `x-request-id` when it is a valid UUID
//! - Open a tracing span carrying the ID for the request's lifetime
//!
//! # Design Decisions
//! - The ID lives in request extensions only; proxied headers are not touched
//! - Assigned as early as possible so every log line can carry it

use std::fmt;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

/// Header a caller may use to supply its own request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Unique identifier for one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Access the request ID stored in extensions.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<RequestId>;
}

impl<B> RequestIdExt for axum::http::Request<B> {
    fn request_id(&self) -> Option<RequestId> {
        self.extensions().get::<RequestId>().copied()
    }
}

/// Middleware assigning a [`RequestId`] to every request.
pub async fn assign_request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .map(RequestId)
        .unwrap_or_default();

    request.extensions_mut().insert(id);

    let span = tracing::info_span!("request", request_id = %id);
    next.run(request).instrument(span).await
}
