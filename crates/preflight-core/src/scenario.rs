//! Scenario descriptors and validator attachment
//!
//! A scenario's metadata is assembled once, at definition time, through
//! [`ScenarioBuilder`]. Attaching a validator only records the rule name and
//! its bound arguments; nothing is evaluated until a
//! [`ValidationRunner`](crate::ValidationRunner) runs.
//!
//! # Example
//!
//! ```rust
//! use preflight_core::{RuleArgs, ScenarioDescriptor};
//!
//! let scenario = ScenarioDescriptor::builder("Images.list_images")
//!     .namespace("cloud")
//!     .validator("required_platform", RuleArgs::new().kw("platform", "cloud").kw("users", true))
//!     .validator("required_services", RuleArgs::new().arg("image"))
//!     .build();
//!
//! let names: Vec<_> = scenario.validators().iter().map(|v| v.rule.as_str()).collect();
//! assert_eq!(names, ["required_platform", "required_services"]);
//! ```

use crate::args::RuleArgs;
use crate::config::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One attached rule with its bound arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorEntry {
    /// Registered rule name
    pub rule: String,
    /// Bound arguments
    pub args: RuleArgs,
}

/// Create an attachment for `rule` without evaluating it
#[inline]
#[must_use]
pub fn attach(rule: impl Into<String>, args: RuleArgs) -> ValidatorEntry {
    ValidatorEntry {
        rule: rule.into(),
        args,
    }
}

/// Kind of argument transformation applied before a scenario runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    /// Local path (home-expanded, made absolute) or URL passed through
    PathOrUrl,
    /// Image creation keyword arguments with legacy keys rewritten
    ImageArgs,
    /// Flavor resource spec resolved to a flavor id
    ComputeFlavor,
}

/// Argument transformation attached to a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgConversion {
    /// Scenario argument name
    pub arg: String,
    /// Transformation kind
    pub kind: ArgKind,
}

/// Immutable scenario metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    name: String,
    namespace: String,
    context: Value,
    validators: Vec<ValidatorEntry>,
    conversions: Vec<ArgConversion>,
}

impl ScenarioDescriptor {
    /// Start building a scenario descriptor
    ///
    /// The namespace starts as [`DEFAULT_NAMESPACE`], which only holds the
    /// platform-independent rules. Scenarios attaching client-backed rules
    /// must call [`ScenarioBuilder::namespace`] with the namespace those
    /// rules are registered under, or their attachments will not resolve.
    #[inline]
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder::new(name)
    }

    /// Scenario name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace searched first for attached rules
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Default context the scenario requests
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Attached validators in attachment order
    #[inline]
    #[must_use]
    pub fn validators(&self) -> &[ValidatorEntry] {
        &self.validators
    }

    /// Argument conversions in attachment order
    #[inline]
    #[must_use]
    pub fn conversions(&self) -> &[ArgConversion] {
        &self.conversions
    }
}

/// Builder for [`ScenarioDescriptor`]
///
/// Every `validator`/`attach` call appends; attachments are never
/// deduplicated or reordered.
#[derive(Debug, Clone)]
#[must_use]
pub struct ScenarioBuilder {
    name: String,
    namespace: String,
    context: Value,
    validators: Vec<ValidatorEntry>,
    conversions: Vec<ArgConversion>,
}

impl ScenarioBuilder {
    /// Create builder for scenario `name` in [`DEFAULT_NAMESPACE`]
    ///
    /// See [`ScenarioDescriptor::builder`] for when to override the namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            context: Value::Object(serde_json::Map::new()),
            validators: Vec::new(),
            conversions: Vec::new(),
        }
    }

    /// Set namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set default context
    pub fn context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    /// Attach a rule with bound arguments
    pub fn validator(self, rule: impl Into<String>, args: RuleArgs) -> Self {
        self.attach(attach(rule, args))
    }

    /// Attach a prepared entry
    pub fn attach(mut self, entry: ValidatorEntry) -> Self {
        self.validators.push(entry);
        self
    }

    /// Attach a rule through a deprecated alias, warning about it
    pub fn attach_deprecated(
        self,
        rule: impl Into<String>,
        deprecated_name: &str,
        since: &str,
        args: RuleArgs,
    ) -> Self {
        let rule = rule.into();
        tracing::warn!(
            scenario = %self.name,
            deprecated = deprecated_name,
            replacement = %rule,
            since,
            "scenario uses deprecated validator '{deprecated_name}'; attach '{rule}' instead"
        );
        self.validator(rule, args)
    }

    /// Attach an argument conversion
    pub fn convert(mut self, arg: impl Into<String>, kind: ArgKind) -> Self {
        self.conversions.push(ArgConversion {
            arg: arg.into(),
            kind,
        });
        self
    }

    /// Name of the scenario being built
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> ScenarioDescriptor {
        ScenarioDescriptor {
            name: self.name,
            namespace: self.namespace,
            context: self.context,
            validators: self.validators,
            conversions: self.conversions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_defaults() {
        let scenario = ScenarioDescriptor::builder("Dummy.noop").build();
        assert_eq!(scenario.name(), "Dummy.noop");
        assert_eq!(scenario.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(scenario.context(), &json!({}));
        assert!(scenario.validators().is_empty());
        assert!(scenario.conversions().is_empty());
    }

    #[test]
    fn attachments_keep_order_and_duplicates() {
        let scenario = ScenarioDescriptor::builder("Dummy.noop")
            .validator("b", RuleArgs::new())
            .attach(attach("a", RuleArgs::new().arg(1)))
            .validator("b", RuleArgs::new())
            .build();

        let names: Vec<_> = scenario.validators().iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
        assert_eq!(scenario.validators()[1].args.positional(), &[json!(1)]);
    }

    #[test]
    fn deprecated_attachment_uses_replacement_name() {
        let scenario = ScenarioDescriptor::builder("Dummy.noop")
            .attach_deprecated(
                "required_platform",
                "required_openstack",
                "0.10.0",
                RuleArgs::new().kw("platform", "cloud"),
            )
            .build();
        assert_eq!(scenario.validators()[0].rule, "required_platform");
    }

    #[test]
    fn conversions_recorded() {
        let scenario = ScenarioDescriptor::builder("Images.create")
            .convert("image_location", ArgKind::PathOrUrl)
            .convert("kwargs", ArgKind::ImageArgs)
            .build();
        assert_eq!(scenario.conversions().len(), 2);
        assert_eq!(scenario.conversions()[1].kind, ArgKind::ImageArgs);
    }
}
