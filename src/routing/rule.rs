//! Compiled prefix rules.
//!
//! A [`Rule`] is the runtime form of a [`RuleConfig`]: the target string is
//! parsed once into an [`Origin`] so the hot path never touches text parsing.

use std::fmt;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};
use thiserror::Error;

use crate::config::validation::parse_origin;
use crate::config::RuleConfig;

/// Error compiling a rule from configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// An upstream origin: scheme + host + port.
#[derive(Debug, Clone)]
pub struct Origin {
    scheme: Scheme,
    authority: Authority,
    host_header: HeaderValue,
}

impl Origin {
    /// Parse an origin such as `http://127.0.0.1:3000`.
    pub fn parse(target: &str) -> Result<Self, RuleError> {
        let invalid = |reason: String| RuleError::InvalidTarget {
            target: target.to_string(),
            reason,
        };

        let url = parse_origin(target).map_err(invalid)?;
        let authority_str = &url[url::Position::BeforeHost..url::Position::AfterPort];
        let authority: Authority = authority_str.parse().map_err(|e| invalid(format!("{e}")))?;
        let host_header =
            HeaderValue::from_str(authority.as_str()).map_err(|e| invalid(format!("{e}")))?;

        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
            host_header,
        })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Value used when rewriting the `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }

    /// Build the upstream URI for an inbound request URI.
    ///
    /// Path and query are carried over unchanged.
    pub fn upstream_uri(&self, inbound: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = inbound
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// A path-prefix → upstream mapping.
#[derive(Debug, Clone)]
pub struct Rule {
    prefix: String,
    target: Origin,
    change_origin: bool,
}

impl Rule {
    pub fn new(prefix: impl Into<String>, target: Origin) -> Self {
        Self {
            prefix: prefix.into(),
            target,
            change_origin: true,
        }
    }

    /// Compile a rule from its config entry.
    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        Ok(Self {
            prefix: config.prefix.clone(),
            target: Origin::parse(&config.target)?,
            change_origin: config.change_origin,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn target(&self) -> &Origin {
        &self.target
    }

    /// Whether the `Host` header is rewritten to the target authority.
    pub fn change_origin(&self) -> bool {
        self.change_origin
    }

    /// Literal, case-sensitive prefix test.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}
