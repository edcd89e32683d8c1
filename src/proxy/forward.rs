//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the rule's target origin
//! - Rewrite `Host` when the rule asks for it
//! - Send through a pooled HTTP/1.1 client under the upstream timeouts
//! - Stream the upstream response back, status/headers/body preserved
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - Dropping the returned future or body cancels the upstream exchange;
//!   hyper closes that connection instead of pooling it
//! - No retries: the first failure is the answer

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::{Body, BodyDataStream};
use axum::http::header::HOST;
use axum::http::{Extensions, HeaderValue, Request, Response, Version};
use futures_util::StreamExt;
use http_body_util::LengthLimitError;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::ProxyConfig;
use crate::proxy::error::ProxyError;
use crate::proxy::headers::strip_hop_by_hop;
use crate::resilience::UpstreamTimeouts;
use crate::routing::{Origin, Rule};

/// Pooled client used for every upstream exchange.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Forwards matched requests to their upstream origin.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    timeouts: UpstreamTimeouts,
    max_response_body_bytes: Option<u64>,
}

impl Forwarder {
    pub fn new(timeouts: UpstreamTimeouts, max_response_body_bytes: Option<u64>) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeouts.connect));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(timeouts.pool_idle)
            .pool_timer(TokioTimer::new())
            .build(connector);

        Self {
            client,
            timeouts,
            max_response_body_bytes,
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Self {
        Self::new(
            UpstreamTimeouts::from(&config.timeouts),
            config.limits.max_response_body_bytes,
        )
    }

    /// Forward `request` to `rule`'s target and return the upstream response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        rule: &Rule,
    ) -> Result<Response<Body>, ProxyError> {
        let target = rule.target();
        let (mut parts, body) = request.into_parts();

        let inbound_authority = parts.uri.authority().cloned();
        parts.uri = target
            .upstream_uri(&parts.uri)
            .map_err(|e| ProxyError::InvalidRequest(e.to_string()))?;
        parts.version = Version::HTTP_11;
        parts.extensions = Extensions::new();

        strip_hop_by_hop(&mut parts.headers);
        if rule.change_origin() {
            parts.headers.insert(HOST, target.host_header().clone());
        } else if !parts.headers.contains_key(HOST) {
            // HTTP/2 callers carry the host in :authority only.
            if let Some(value) = inbound_authority.and_then(|a| a.as_str().parse::<HeaderValue>().ok()) {
                parts.headers.insert(HOST, value);
            }
        }

        tracing::trace!(method = %parts.method, uri = %parts.uri, "Sending upstream request");

        let upstream_request = Request::from_parts(parts, body);
        let response =
            match tokio::time::timeout(self.timeouts.response, self.client.request(upstream_request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => return Err(classify(&e, target)),
                Err(_) => {
                    return Err(ProxyError::UpstreamTimeout {
                        target: target.to_string(),
                        reason: format!("no response within {:?}", self.timeouts.response),
                    })
                }
            };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        let body = relay_body(
            Body::new(body),
            target.to_string(),
            self.timeouts.idle,
            self.max_response_body_bytes,
        );
        Ok(Response::from_parts(parts, body))
    }
}

/// Map a client error onto the proxy error taxonomy.
fn classify(err: &hyper_util::client::legacy::Error, target: &Origin) -> ProxyError {
    let target = target.to_string();
    let reason = error_chain(err);

    if err.is_connect() {
        return ProxyError::UpstreamUnavailable { target, reason };
    }

    // The caller's body failed mid-send; the upstream is not at fault.
    if find_source::<LengthLimitError>(err).is_some() {
        return ProxyError::RequestBodyTooLarge(reason);
    }

    if let Some(hyper_err) = find_source::<hyper::Error>(err) {
        if hyper_err.is_user() {
            return ProxyError::InvalidRequest(reason);
        }
        if hyper_err.is_parse() || hyper_err.is_parse_status() || hyper_err.is_incomplete_message() {
            return ProxyError::MalformedUpstreamResponse { target, reason };
        }
        if hyper_err.is_timeout() {
            return ProxyError::UpstreamTimeout { target, reason };
        }
    }

    ProxyError::UpstreamUnavailable { target, reason }
}

fn find_source<'a, T: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a T> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<T>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        message.push_str(": ");
        message.push_str(&e.to_string());
        current = e.source();
    }
    message
}

struct Relay {
    stream: BodyDataStream,
    target: String,
    idle: Duration,
    remaining: Option<u64>,
    done: bool,
}

/// Wrap an upstream body so stalls and oversize bodies abort the stream.
fn relay_body(body: Body, target: String, idle: Duration, limit: Option<u64>) -> Body {
    let relay = Relay {
        stream: body.into_data_stream(),
        target,
        idle,
        remaining: limit,
        done: false,
    };

    let stream = futures_util::stream::unfold(relay, |mut relay| async move {
        if relay.done {
            return None;
        }

        let next = match tokio::time::timeout(relay.idle, relay.stream.next()).await {
            Ok(Some(next)) => next,
            Ok(None) => return None,
            Err(_) => {
                relay.done = true;
                tracing::warn!(upstream = %relay.target, idle = ?relay.idle, "Upstream body stalled, aborting");
                let err = ProxyError::UpstreamTimeout {
                    target: relay.target.clone(),
                    reason: format!("no body data within {:?}", relay.idle),
                };
                return Some((Err(err), relay));
            }
        };

        let item = match next {
            Ok(chunk) => match relay.remaining.as_mut() {
                Some(remaining) if chunk.len() as u64 > *remaining => {
                    relay.done = true;
                    tracing::warn!(upstream = %relay.target, "Upstream body exceeded size limit, aborting");
                    Err(ProxyError::UpstreamTimeout {
                        target: relay.target.clone(),
                        reason: "response body exceeded the configured size limit".to_string(),
                    })
                }
                Some(remaining) => {
                    *remaining -= chunk.len() as u64;
                    Ok(chunk)
                }
                None => Ok(chunk),
            },
            Err(e) => {
                relay.done = true;
                tracing::warn!(upstream = %relay.target, error = %e, "Upstream body failed");
                Err(ProxyError::MalformedUpstreamResponse {
                    target: relay.target.clone(),
                    reason: e.to_string(),
                })
            }
        };

        Some((item, relay))
    });

    Body::from_stream(stream)
}
