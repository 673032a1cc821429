//! Validation runner
//!
//! Evaluates a scenario's attached rules, in attachment order, before the
//! scenario body runs. The first invalid outcome ends the pass; there is no
//! aggregation of later failures.

use crate::clients::Deployment;
use crate::config::{RunnerConfig, ScenarioConfig};
use crate::error::{RegistryError, RuleResult};
use crate::outcome::Outcome;
use crate::registry::RuleRegistry;
use crate::rule::RuleInput;
use crate::scenario::ScenarioDescriptor;
use serde_json::Value;

/// Runs attached rules against one invocation
#[derive(Debug, Clone)]
pub struct ValidationRunner<'r> {
    registry: &'r RuleRegistry,
    config: RunnerConfig,
}

impl<'r> ValidationRunner<'r> {
    /// Create runner over a populated registry
    #[inline]
    #[must_use]
    pub fn new(registry: &'r RuleRegistry, config: RunnerConfig) -> Self {
        Self { registry, config }
    }

    /// Runner settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Check that every attached rule resolves
    ///
    /// # Errors
    /// Returns the first [`RegistryError::NotFound`] encountered
    pub fn check_attachments(&self, scenario: &ScenarioDescriptor) -> Result<(), RegistryError> {
        for entry in scenario.validators() {
            self.registry.resolve(
                scenario.namespace(),
                &entry.rule,
                &self.config.fallback_namespace,
            )?;
        }
        Ok(())
    }

    /// Validate one scenario invocation
    ///
    /// Rules receive no pre-resolved clients; each rule requests the
    /// credentials it needs from `deployment`.
    ///
    /// # Errors
    /// - [`ValidationError::Registry`](crate::ValidationError::Registry) if an
    ///   attached rule is not registered
    /// - any hard error raised by a rule, wrapped with the rule name
    pub fn validate(
        &self,
        scenario: &ScenarioDescriptor,
        config: &ScenarioConfig,
        deployment: &dyn Deployment,
        plugin_config: Option<&Value>,
    ) -> RuleResult<Outcome> {
        for entry in scenario.validators() {
            let rule = self.registry.resolve(
                scenario.namespace(),
                &entry.rule,
                &self.config.fallback_namespace,
            )?;

            tracing::debug!(
                scenario = scenario.name(),
                rule = %entry.rule,
                namespace = scenario.namespace(),
                "evaluating rule"
            );

            let input = RuleInput::new(config, deployment, &self.config.platform, &entry.rule)
                .with_plugin_config(plugin_config);
            let outcome = rule
                .evaluate(&input, &entry.args)
                .map_err(|e| e.in_rule(&entry.rule))?;

            if let Some(message) = outcome.message() {
                tracing::info!(
                    scenario = scenario.name(),
                    rule = %entry.rule,
                    message,
                    "scenario validation failed"
                );
                return Ok(outcome);
            }
        }

        tracing::debug!(
            scenario = scenario.name(),
            rules = scenario.validators().len(),
            "scenario validation passed"
        );
        Ok(Outcome::Valid)
    }
}
