//! Scenario catalog
//!
//! Holds scenario descriptors by name. Registration checks that every
//! attached rule resolves against the rule registry, so a scenario naming an
//! unknown rule never makes it into the catalog.

use crate::convert::convert_args;
use crate::error::{ScenarioError, ScenarioResult};
use crate::images;
use indexmap::IndexMap;
use preflight_core::{
    ComputeClient, Deployment, Outcome, RuleRegistry, RunnerConfig, ScenarioConfig,
    ScenarioDescriptor, ValidationRunner,
};
use serde_json::{Map, Value};

/// Registered scenarios with the runner that validates them
#[derive(Debug)]
pub struct Catalog<'r> {
    runner: ValidationRunner<'r>,
    scenarios: IndexMap<String, ScenarioDescriptor>,
}

impl<'r> Catalog<'r> {
    /// Create empty catalog over a rule registry
    #[must_use]
    pub fn new(registry: &'r RuleRegistry, config: RunnerConfig) -> Self {
        Self {
            runner: ValidationRunner::new(registry, config),
            scenarios: IndexMap::new(),
        }
    }

    /// Catalog holding every built-in scenario
    ///
    /// # Errors
    /// See [`Catalog::register`]
    pub fn builtin(registry: &'r RuleRegistry) -> ScenarioResult<Self> {
        let mut catalog = Self::new(registry, RunnerConfig::new());
        for descriptor in images::descriptors() {
            catalog.register(descriptor)?;
        }
        tracing::debug!(scenarios = catalog.len(), "loaded built-in scenarios");
        Ok(catalog)
    }

    /// Add a scenario
    ///
    /// # Errors
    /// - [`ScenarioError::Duplicate`] if the name is taken
    /// - [`ScenarioError::Registry`] if an attached rule does not resolve
    pub fn register(&mut self, descriptor: ScenarioDescriptor) -> ScenarioResult<()> {
        if self.scenarios.contains_key(descriptor.name()) {
            return Err(ScenarioError::Duplicate(descriptor.name().to_string()));
        }
        self.runner
            .check_attachments(&descriptor)
            .map_err(|source| ScenarioError::Registry {
                scenario: descriptor.name().to_string(),
                source,
            })?;
        self.scenarios
            .insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    /// Look up a scenario
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScenarioDescriptor> {
        self.scenarios.get(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    /// Number of registered scenarios
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Check if no scenarios are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Validate one invocation of scenario `name`
    ///
    /// # Errors
    /// - [`ScenarioError::Unknown`] if `name` is not registered
    /// - [`ScenarioError::Validation`] if a rule raises a hard error
    pub fn validate(
        &self,
        name: &str,
        config: &ScenarioConfig,
        deployment: &dyn Deployment,
        plugin_config: Option<&Value>,
    ) -> ScenarioResult<Outcome> {
        let scenario = self.lookup(name)?;
        Ok(self
            .runner
            .validate(scenario, config, deployment, plugin_config)?)
    }

    /// Validated, converted arguments for scenario `name`
    ///
    /// `plugin_config` reaches the rules exactly as in [`Catalog::validate`].
    /// Returns `Ok(Err(outcome))` when validation fails, leaving the
    /// arguments unconverted.
    ///
    /// # Errors
    /// As [`Catalog::validate`], plus conversion errors
    pub fn prepare(
        &self,
        name: &str,
        config: &ScenarioConfig,
        deployment: &dyn Deployment,
        plugin_config: Option<&Value>,
        compute: Option<&dyn ComputeClient>,
    ) -> ScenarioResult<Result<Map<String, Value>, Outcome>> {
        let scenario = self.lookup(name)?;
        let outcome = self
            .runner
            .validate(scenario, config, deployment, plugin_config)?;
        if !outcome.is_valid() {
            return Ok(Err(outcome));
        }
        let mut args = config.args().clone();
        convert_args(scenario, &mut args, compute)?;
        Ok(Ok(args))
    }

    fn lookup(&self, name: &str) -> ScenarioResult<&ScenarioDescriptor> {
        self.get(name)
            .ok_or_else(|| ScenarioError::Unknown(name.to_string()))
    }
}
