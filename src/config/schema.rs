//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the dev proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Ordered prefix rules. Declaration order is match order.
    pub rules: Vec<RuleConfig>,

    /// Upstream timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body size limits.
    pub limits: LimitsConfig,

    /// Static bundle served on pass-through.
    pub static_files: StaticFilesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            rules: vec![
                RuleConfig::new("/api", "http://127.0.0.1:3000"),
                RuleConfig::new("/auth", "http://127.0.0.1:3000"),
            ],
            timeouts: TimeoutConfig::default(),
            limits: LimitsConfig::default(),
            static_files: StaticFilesConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5173").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5173".to_string(),
        }
    }
}

/// A single prefix rule as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Literal path prefix to match.
    pub prefix: String,

    /// Upstream origin, e.g. "http://127.0.0.1:3000".
    pub target: String,

    /// Rewrite the Host header to the target authority.
    #[serde(default = "default_change_origin")]
    pub change_origin: bool,
}

impl RuleConfig {
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
            change_origin: default_change_origin(),
        }
    }
}

fn default_change_origin() -> bool {
    true
}

/// Timeout configuration for upstream exchanges.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream response head, in seconds.
    pub request_secs: u64,

    /// Maximum gap between upstream body chunks, in seconds.
    pub idle_secs: u64,

    /// How long an idle pooled upstream connection is kept, in seconds.
    pub pool_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 60,
            pool_idle_secs: 90,
        }
    }
}

/// Body size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body size in bytes.
    pub max_request_body_bytes: usize,

    /// Maximum relayed upstream response body size in bytes (None = unlimited).
    pub max_response_body_bytes: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_body_bytes: 10 * 1024 * 1024, // 10MB
            max_response_body_bytes: None,
        }
    }
}

/// Static front-end bundle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory to serve unmatched requests from.
    pub root: Option<PathBuf>,

    /// Serve `index.html` for paths that do not resolve to a file.
    pub spa_fallback: bool,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: None,
            spa_fallback: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reproduces_observed_rules() {
        let config = ProxyConfig::default();
        let prefixes: Vec<_> = config.rules.iter().map(|r| r.prefix.as_str()).collect();
        assert_eq!(prefixes, ["/api", "/auth"]);
        assert!(config.rules.iter().all(|r| r.target == "http://127.0.0.1:3000"));
        assert!(config.rules.iter().all(|r| r.change_origin));
    }

    #[test]
    fn omitted_sections_use_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            [[rules]]
            prefix = "/graphql"
            target = "http://localhost:4000"
            change_origin = false
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.len(), 1);
        assert!(!config.rules[0].change_origin);
        assert_eq!(config.listener.bind_address, "127.0.0.1:5173");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }
}
