//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled rules in declaration order
//! - Look up the matching rule for a request path
//! - Return matched rule or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (rule tables are a handful of entries)
//! - First match wins; no longest-prefix reordering
//! - Explicit `None` rather than silent default

use crate::config::validation::shadowed_rules;
use crate::config::RuleConfig;
use crate::routing::rule::{Rule, RuleError};

/// Ordered, immutable rule table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    /// Build a router from already compiled rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile the rule table from configuration.
    pub fn from_config(configs: &[RuleConfig]) -> Result<Self, RuleError> {
        let rules = configs
            .iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        for (earlier, later) in shadowed_rules(configs) {
            tracing::warn!(
                prefix = %configs[later].prefix,
                shadowed_by = %configs[earlier].prefix,
                "Rule can never match, an earlier prefix takes every request"
            );
        }

        for rule in &rules {
            tracing::debug!(prefix = %rule.prefix(), upstream = %rule.target(), "Proxy rule loaded");
        }

        Ok(Self { rules })
    }

    /// Return the first rule, in declaration order, whose prefix starts `path`.
    pub fn match_path(&self, path: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
