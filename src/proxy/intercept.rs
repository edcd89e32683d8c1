//! Proxy interceptor middleware.
//!
//! Installed in front of the dev server's own handlers. Every request is
//! checked against the rule table: a match is forwarded and the upstream
//! response returned, anything else continues down the stack via `next`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::proxy::forward::Forwarder;
use crate::routing::Router;

/// State shared by every interceptor invocation.
#[derive(Clone)]
pub struct ProxyState {
    pub router: Arc<Router>,
    pub forwarder: Forwarder,
}

/// Forward matching requests, pass the rest to `next`.
pub async fn intercept(State(state): State<ProxyState>, request: Request, next: Next) -> Response {
    let Some(rule) = state.router.match_path(request.uri().path()) else {
        return next.run(request).await;
    };

    let start = Instant::now();
    let request_id = request.request_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = ?request_id,
        method = %method,
        path = %path,
        prefix = %rule.prefix(),
        upstream = %rule.target(),
        "Proxying request"
    );

    match state.forwarder.forward(request, rule).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_exchange(rule.prefix(), status.as_u16(), start);
            tracing::info!(
                request_id = ?request_id,
                method = %method,
                path = %path,
                upstream = %rule.target(),
                status = status.as_u16(),
                latency_ms = start.elapsed().as_millis() as u64,
                "Proxied request"
            );
            response
        }
        Err(err) => {
            if err.is_upstream() {
                metrics::record_upstream_error(rule.prefix(), err.kind());
            }
            metrics::record_exchange(rule.prefix(), err.status().as_u16(), start);
            tracing::warn!(
                request_id = ?request_id,
                method = %method,
                path = %path,
                kind = err.kind(),
                error = %err,
                "Upstream exchange failed"
            );
            err.into_response()
        }
    }
}
