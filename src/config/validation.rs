//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate rule prefixes and upstream origins
//! - Reject rules that would proxy back into the listener
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use url::{Host, Url};

use crate::config::schema::{ProxyConfig, RuleConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {address:?}: {reason}")]
    InvalidBindAddress { address: String, reason: String },

    #[error("rule {index}: prefix {prefix:?} must be non-empty and start with '/'")]
    InvalidPrefix { index: usize, prefix: String },

    #[error("rule {index}: prefix {prefix:?} is already declared by an earlier rule")]
    DuplicatePrefix { index: usize, prefix: String },

    #[error("rule {index}: invalid target {target:?}: {reason}")]
    InvalidTarget {
        index: usize,
        target: String,
        reason: String,
    },

    #[error("rule {index}: target {target:?} points back at the listener")]
    SelfReferentialTarget { index: usize, target: String },

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let bind = match parse_bind_address(&config.listener.bind_address) {
        Ok(addr) => addr,
        Err(reason) => {
            errors.push(ValidationError::InvalidBindAddress {
                address: config.listener.bind_address.clone(),
                reason,
            });
            None
        }
    };

    let mut seen = HashSet::new();
    for (index, rule) in config.rules.iter().enumerate() {
        if !rule.prefix.starts_with('/') {
            errors.push(ValidationError::InvalidPrefix {
                index,
                prefix: rule.prefix.clone(),
            });
        } else if !seen.insert(rule.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix {
                index,
                prefix: rule.prefix.clone(),
            });
        }

        match parse_origin(&rule.target) {
            Ok(url) => {
                if let Some(bind) = bind {
                    if targets_listener(&url, bind) {
                        errors.push(ValidationError::SelfReferentialTarget {
                            index,
                            target: rule.target.clone(),
                        });
                    }
                }
            }
            Err(reason) => errors.push(ValidationError::InvalidTarget {
                index,
                target: rule.target.clone(),
                reason,
            }),
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("request_secs", timeouts.request_secs),
        ("idle_secs", timeouts.idle_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a listener address the way `TcpListener::bind` would take it.
///
/// Returns the socket address when it is known without a DNS lookup, which
/// is what the self-loop check needs. `localhost` counts as loopback.
fn parse_bind_address(address: &str) -> Result<Option<SocketAddr>, String> {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(Some(addr));
    }

    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| "expected host:port".to_string())?;
    let port: u16 = port
        .parse()
        .map_err(|_| format!("invalid port {port:?}"))?;
    if host.is_empty() || host.contains(':') {
        return Err(format!("invalid host {host:?}"));
    }

    if host.eq_ignore_ascii_case("localhost") {
        return Ok(Some(SocketAddr::from(([127, 0, 0, 1], port))));
    }
    Ok(None)
}

/// Parse a rule target and check it is a bare `http` origin.
pub fn parse_origin(target: &str) -> Result<Url, String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;

    if url.scheme() != "http" {
        return Err(format!("scheme {:?} is not supported, use http", url.scheme()));
    }
    if url.host().is_none() {
        return Err("missing host".to_string());
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err("credentials are not allowed in a target".to_string());
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err("target must be an origin without path, query or fragment".to_string());
    }

    Ok(url)
}

/// Whether `url` resolves to the proxy's own listen address.
fn targets_listener(url: &Url, bind: SocketAddr) -> bool {
    // Ephemeral binds cannot be known up front.
    if bind.port() == 0 || url.port_or_known_default() != Some(bind.port()) {
        return false;
    }

    let bind_ip = bind.ip();
    match url.host() {
        Some(Host::Domain(domain)) => {
            domain.eq_ignore_ascii_case("localhost")
                && (bind_ip.is_loopback() || bind_ip.is_unspecified())
        }
        Some(Host::Ipv4(ip)) => same_host(IpAddr::V4(ip), bind_ip),
        Some(Host::Ipv6(ip)) => same_host(IpAddr::V6(ip), bind_ip),
        None => false,
    }
}

fn same_host(target: IpAddr, bind: IpAddr) -> bool {
    target == bind || (bind.is_unspecified() && (target.is_loopback() || target.is_unspecified()))
}

/// Prefix pairs where an earlier rule makes a later one unreachable.
pub fn shadowed_rules(rules: &[RuleConfig]) -> Vec<(usize, usize)> {
    let mut shadowed = Vec::new();
    for (later, rule) in rules.iter().enumerate() {
        if let Some(earlier) = rules[..later]
            .iter()
            .position(|r| r.prefix != rule.prefix && rule.prefix.starts_with(&r.prefix))
        {
            shadowed.push((earlier, later));
        }
    }
    shadowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(rules: Vec<RuleConfig>) -> ProxyConfig {
        ProxyConfig {
            rules,
            ..ProxyConfig::default()
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn rejects_bad_prefixes_and_duplicates() {
        let config = config_with(vec![
            RuleConfig::new("api", "http://127.0.0.1:3000"),
            RuleConfig::new("", "http://127.0.0.1:3000"),
            RuleConfig::new("/auth", "http://127.0.0.1:3000"),
            RuleConfig::new("/auth", "http://127.0.0.1:4000"),
        ]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPrefix { index: 0, prefix: "api".into() },
                ValidationError::InvalidPrefix { index: 1, prefix: "".into() },
                ValidationError::DuplicatePrefix { index: 3, prefix: "/auth".into() },
            ]
        );
    }

    #[test]
    fn rejects_non_origin_targets() {
        for target in [
            "not a url",
            "https://127.0.0.1:3000",
            "http://127.0.0.1:3000/api",
            "http://127.0.0.1:3000/?q=1",
            "http://user:pw@127.0.0.1:3000",
            "unix:/tmp/socket",
        ] {
            let config = config_with(vec![RuleConfig::new("/api", target)]);
            let errors = validate_config(&config).unwrap_err();
            assert!(
                matches!(errors.as_slice(), [ValidationError::InvalidTarget { index: 0, .. }]),
                "{target} should be rejected, got {errors:?}"
            );
        }
    }

    #[test]
    fn accepts_origin_with_trailing_slash() {
        let config = config_with(vec![RuleConfig::new("/api", "http://localhost:3000/")]);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn rejects_self_referential_target() {
        let mut config = config_with(vec![
            RuleConfig::new("/api", "http://127.0.0.1:5173"),
            RuleConfig::new("/auth", "http://localhost:5173"),
            RuleConfig::new("/ok", "http://127.0.0.1:3000"),
        ]);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ValidationError::SelfReferentialTarget { .. })));

        config.listener.bind_address = "0.0.0.0:5173".into();
        assert_eq!(validate_config(&config).unwrap_err().len(), 2);

        // Ephemeral port: loop cannot be detected up front.
        config.listener.bind_address = "127.0.0.1:0".into();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn accepts_hostname_bind_addresses() {
        let mut config = config_with(vec![RuleConfig::new("/api", "http://127.0.0.1:3000")]);
        for address in ["localhost:5173", "dev.internal:8080", "[::1]:5173"] {
            config.listener.bind_address = address.into();
            assert_eq!(validate_config(&config), Ok(()), "{address}");
        }

        for address in ["localhost", ":5173", "localhost:http", "localhost:70000"] {
            config.listener.bind_address = address.into();
            assert!(
                matches!(
                    validate_config(&config).unwrap_err().as_slice(),
                    [ValidationError::InvalidBindAddress { .. }]
                ),
                "{address} should be rejected"
            );
        }
    }

    #[test]
    fn localhost_bind_still_detects_loops() {
        let mut config = config_with(vec![RuleConfig::new("/api", "http://127.0.0.1:5173")]);
        config.listener.bind_address = "localhost:5173".into();
        assert!(matches!(
            validate_config(&config).unwrap_err().as_slice(),
            [ValidationError::SelfReferentialTarget { index: 0, .. }]
        ));
    }

    #[test]
    fn collects_every_error() {
        let mut config = config_with(vec![RuleConfig::new("api", "ftp://x")]);
        config.listener.bind_address = "nowhere".into();
        config.timeouts.connect_secs = 0;
        config.timeouts.idle_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroTimeout { field: "connect_secs" }));
        assert!(errors.contains(&ValidationError::ZeroTimeout { field: "idle_secs" }));
    }

    #[test]
    fn reports_shadowed_rules() {
        let rules = vec![
            RuleConfig::new("/a", "http://127.0.0.1:3000"),
            RuleConfig::new("/api", "http://127.0.0.1:3000"),
            RuleConfig::new("/auth", "http://127.0.0.1:3000"),
            RuleConfig::new("/static", "http://127.0.0.1:3000"),
        ];
        assert_eq!(shadowed_rules(&rules), vec![(0, 1), (0, 2)]);
    }
}
