//! Policy oracle interface.
//!
//! The oracle answers allow/block questions over a (source hostname,
//! destination hostname, category) triple, and evaluates hostname-scoped
//! feature switches. The pipeline only queries it; how rules are matched is up
//! to the implementation.
//!
//! [`StaticPolicy`] is a plain lookup table for tests and trace replay.

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Hostname-scoped feature toggles consulted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Switch {
    /// Block insecure sub-requests made by a securely loaded page.
    HttpsStrict,
    /// Replace cross-domain `Referer` headers.
    ReferrerSpoof,
    /// Replace the `User-Agent` header.
    UaSpoof,
}

impl Switch {
    /// Returns the switch name as used in rule storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Switch::HttpsStrict => "https-strict",
            Switch::ReferrerSpoof => "referrer-spoof",
            Switch::UaSpoof => "ua-spoof",
        }
    }
}

impl std::fmt::Display for Switch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Query contract of the rule matrix. Queries have no side effects.
pub trait PolicyOracle: Send + Sync {
    /// Returns true if `category` requests from `source` to `destination` must be blocked.
    fn must_block(&self, source: &str, destination: &str, category: Category) -> bool;

    /// Negation of [`PolicyOracle::must_block`].
    fn must_allow(&self, source: &str, destination: &str, category: Category) -> bool {
        !self.must_block(source, destination, category)
    }

    /// Returns true if `switch` is enabled for pages on `scope`.
    fn evaluate_switch(&self, switch: Switch, scope: &str) -> bool;
}

/// Hostname pattern: `*` or an exact hostname.
const ANY: &str = "*";

fn host_matches(pattern: &str, hostname: &str) -> bool {
    pattern == ANY || pattern.eq_ignore_ascii_case(hostname)
}

/// Action of a [`PolicyRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    /// Allow matching requests.
    #[default]
    Allow,
    /// Block matching requests.
    Block,
}

/// A single table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Source hostname or `*`.
    pub source: String,
    /// Destination hostname or `*`.
    pub destination: String,
    /// Category the rule applies to; `None` matches every category.
    #[serde(default)]
    pub category: Option<Category>,
    /// What to do with matching requests.
    pub action: RuleAction,
}

impl PolicyRule {
    fn matches(&self, source: &str, destination: &str, category: Category) -> bool {
        host_matches(&self.source, source)
            && host_matches(&self.destination, destination)
            && self.category.map_or(true, |c| c == category)
    }
}

/// A switch enabled for a scope hostname or `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRule {
    /// The switch.
    pub switch: Switch,
    /// Scope hostname or `*`.
    pub scope: String,
    /// Whether the switch is on for this scope.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Fixed lookup-table oracle. The first matching rule decides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticPolicy {
    /// Decision when no rule matches.
    pub default_action: RuleAction,
    /// Rules, checked in order.
    pub rules: Vec<PolicyRule>,
    /// Switch settings, checked in order.
    pub switches: Vec<SwitchRule>,
}

impl StaticPolicy {
    /// Creates a table that allows everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Creates a table that blocks everything not explicitly allowed.
    pub fn block_all() -> Self {
        Self {
            default_action: RuleAction::Block,
            ..Self::default()
        }
    }

    fn with_rule(
        mut self,
        source: &str,
        destination: &str,
        category: Option<Category>,
        action: RuleAction,
    ) -> Self {
        self.rules.push(PolicyRule {
            source: source.to_string(),
            destination: destination.to_string(),
            category,
            action,
        });
        self
    }

    /// Adds a block rule for `category` (any category if `None`).
    pub fn block(self, source: &str, destination: &str, category: Option<Category>) -> Self {
        self.with_rule(source, destination, category, RuleAction::Block)
    }

    /// Adds an allow rule for `category` (any category if `None`).
    pub fn allow(self, source: &str, destination: &str, category: Option<Category>) -> Self {
        self.with_rule(source, destination, category, RuleAction::Allow)
    }

    /// Enables `switch` for pages on `scope`.
    pub fn with_switch(mut self, switch: Switch, scope: &str) -> Self {
        self.switches.push(SwitchRule {
            switch,
            scope: scope.to_string(),
            enabled: true,
        });
        self
    }
}

impl PolicyOracle for StaticPolicy {
    fn must_block(&self, source: &str, destination: &str, category: Category) -> bool {
        let action = self
            .rules
            .iter()
            .find(|r| r.matches(source, destination, category))
            .map(|r| r.action)
            .unwrap_or(self.default_action);
        action == RuleAction::Block
    }

    fn evaluate_switch(&self, switch: Switch, scope: &str) -> bool {
        self.switches
            .iter()
            .find(|s| s.switch == switch && host_matches(&s.scope, scope))
            .map(|s| s.enabled)
            .unwrap_or(false)
    }
}
