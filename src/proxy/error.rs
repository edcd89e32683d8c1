//! Failed upstream exchanges.
//!
//! Each variant maps to a gateway-style status for the original caller:
//! - `UpstreamUnavailable` → 502 Bad Gateway
//! - `UpstreamTimeout` → 504 Gateway Timeout
//! - `MalformedUpstreamResponse` → 502 Bad Gateway
//!
//! Failures of the caller's own request body are not blamed on the upstream:
//! an upload over the inbound limit is 413, an aborted upload is 400.
//!
//! A path matching no rule is not an error; the interceptor hands the
//! request to the next handler instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Connection refused, DNS failure or connect timeout.
    #[error("upstream {target} is unavailable: {reason}")]
    UpstreamUnavailable { target: String, reason: String },

    /// No response head, or no body progress, within the configured bound.
    #[error("upstream {target} timed out: {reason}")]
    UpstreamTimeout { target: String, reason: String },

    /// The upstream violated the HTTP protocol.
    #[error("malformed response from upstream {target}: {reason}")]
    MalformedUpstreamResponse { target: String, reason: String },

    /// The caller's streamed body went past `limits.max_request_body_bytes`.
    #[error("request body too large: {0}")]
    RequestBodyTooLarge(String),

    /// The inbound request could not be turned into an upstream request,
    /// or its body failed while being sent.
    #[error("cannot build upstream request: {0}")]
    InvalidRequest(String),
}

impl ProxyError {
    /// Stable identifier used in error bodies, logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::UpstreamUnavailable { .. } => "upstream_unavailable",
            ProxyError::UpstreamTimeout { .. } => "upstream_timeout",
            ProxyError::MalformedUpstreamResponse { .. } => "malformed_upstream_response",
            ProxyError::RequestBodyTooLarge(_) => "request_body_too_large",
            ProxyError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Whether the failure lies with the upstream rather than the caller.
    pub fn is_upstream(&self) -> bool {
        !matches!(
            self,
            ProxyError::RequestBodyTooLarge(_) | ProxyError::InvalidRequest(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::UpstreamUnavailable { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::MalformedUpstreamResponse { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::RequestBodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_gateway_statuses() {
        let unavailable = ProxyError::UpstreamUnavailable {
            target: "http://127.0.0.1:3000".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(unavailable.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(unavailable.kind(), "upstream_unavailable");

        let timeout = ProxyError::UpstreamTimeout {
            target: "http://127.0.0.1:3000".into(),
            reason: "no response within 30s".into(),
        };
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let malformed = ProxyError::MalformedUpstreamResponse {
            target: "http://127.0.0.1:3000".into(),
            reason: "invalid HTTP version".into(),
        };
        assert_eq!(malformed.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(malformed.kind(), "malformed_upstream_response");
        assert!(malformed.is_upstream());
    }

    #[test]
    fn caller_failures_are_not_gateway_errors() {
        let too_large = ProxyError::RequestBodyTooLarge("length limit exceeded".into());
        assert_eq!(too_large.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(too_large.kind(), "request_body_too_large");
        assert!(!too_large.is_upstream());

        let aborted = ProxyError::InvalidRequest("body stream failed".into());
        assert_eq!(aborted.status(), StatusCode::BAD_REQUEST);
        assert!(!aborted.is_upstream());
    }

    #[tokio::test]
    async fn response_body_names_the_kind() {
        let response = ProxyError::UpstreamUnavailable {
            target: "http://127.0.0.1:3000".into(),
            reason: "connection refused".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["kind"], "upstream_unavailable");
        assert_eq!(
            body["error"],
            "upstream http://127.0.0.1:3000 is unavailable: connection refused"
        );
    }
}
