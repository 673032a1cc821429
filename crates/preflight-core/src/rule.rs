//! Rule trait and evaluation input

use crate::args::RuleArgs;
use crate::clients::{ClientHandleSet, Deployment};
use crate::config::ScenarioConfig;
use crate::error::RuleResult;
use crate::outcome::Outcome;
use serde_json::Value;
use std::fmt;

/// A named validation predicate
///
/// Expected failures are returned as [`Outcome::Invalid`]. `Err` is reserved
/// for programmer errors (bad bindings, malformed input shapes) and for
/// collaborator failures other than lookup misses.
pub trait Rule: Send + Sync + fmt::Debug {
    /// Evaluate the rule against one configuration
    fn evaluate(&self, input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome>;
}

/// Everything a rule may inspect during one evaluation
#[derive(Clone, Copy)]
pub struct RuleInput<'a> {
    /// Scenario configuration under validation
    pub config: &'a ScenarioConfig,
    /// Resolved client handle set (`None` when the caller resolved none)
    pub clients: Option<&'a dyn ClientHandleSet>,
    /// Deployment descriptor
    pub deployment: &'a dyn Deployment,
    /// Scenario plugin settings, if any
    pub plugin_config: Option<&'a Value>,
    /// Platform whose credentials rules should use
    pub platform: &'a str,
    /// Name the rule was attached under
    pub rule: &'a str,
}

impl<'a> RuleInput<'a> {
    /// Create input with no clients and no plugin settings
    #[must_use]
    pub fn new(
        config: &'a ScenarioConfig,
        deployment: &'a dyn Deployment,
        platform: &'a str,
        rule: &'a str,
    ) -> Self {
        Self {
            config,
            clients: None,
            deployment,
            plugin_config: None,
            platform,
            rule,
        }
    }

    /// With resolved clients
    #[inline]
    #[must_use]
    pub fn with_clients(mut self, clients: &'a dyn ClientHandleSet) -> Self {
        self.clients = Some(clients);
        self
    }

    /// With plugin settings
    #[inline]
    #[must_use]
    pub fn with_plugin_config(mut self, plugin_config: Option<&'a Value>) -> Self {
        self.plugin_config = plugin_config;
        self
    }
}

impl fmt::Debug for RuleInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleInput")
            .field("config", self.config)
            .field("has_clients", &self.clients.is_some())
            .field("plugin_config", &self.plugin_config)
            .field("platform", &self.platform)
            .field("rule", &self.rule)
            .finish_non_exhaustive()
    }
}

/// Rule backed by a plain function or closure
///
/// Handy for rules that need no state beyond their bound arguments.
pub struct FnRule<F> {
    name: &'static str,
    check: F,
}

impl<F> FnRule<F>
where
    F: Fn(&RuleInput<'_>, &RuleArgs) -> RuleResult<Outcome> + Send + Sync,
{
    /// Wrap a function as a rule
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, check: F) -> Self {
        Self { name, check }
    }
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&RuleInput<'_>, &RuleArgs) -> RuleResult<Outcome> + Send + Sync,
{
    fn evaluate(&self, input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
        (self.check)(input, args)
    }
}
