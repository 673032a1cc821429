//! Scenario and runner configuration
//!
//! [`ScenarioConfig`] is the per-invocation document rules inspect.
//! [`RunnerConfig`] holds the runner's own settings.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Platform whose credentials drive client fan-out by default
pub const DEFAULT_PLATFORM: &str = "cloud";

/// Namespace for platform-agnostic rules
pub const DEFAULT_NAMESPACE: &str = "default";

/// Scenario invocation document
///
/// An ordered mapping with an `args` section (scenario arguments) and a
/// `context` section (declared contexts, API version overrides,
/// pre-provisioned resources). Read-only for the whole validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    value: Value,
}

impl ScenarioConfig {
    /// Create from JSON value
    ///
    /// # Errors
    /// Returns error if the root, `args` or `context` is not a mapping
    pub fn new(value: Value) -> Result<Self, ConfigError> {
        let Some(root) = value.as_object() else {
            return Err(ConfigError::NotAMapping("configuration".to_string()));
        };
        for section in ["args", "context"] {
            if root.get(section).is_some_and(|v| !v.is_object()) {
                return Err(ConfigError::NotAMapping(format!("'{section}'")));
            }
        }
        Ok(Self { value })
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid or has the wrong shape
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid or has the wrong shape
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::new(serde_yaml::from_str(yaml)?)
    }

    /// Whole document
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Scenario arguments (empty when absent)
    #[must_use]
    pub fn args(&self) -> &Map<String, Value> {
        self.section("args")
    }

    /// Declared contexts (empty when absent)
    #[must_use]
    pub fn context(&self) -> &Map<String, Value> {
        self.section("context")
    }

    /// Single scenario argument
    #[inline]
    #[must_use]
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args().get(name)
    }

    /// Single context entry
    #[inline]
    #[must_use]
    pub fn context_entry(&self, name: &str) -> Option<&Value> {
        self.context().get(name)
    }

    /// `context.api_versions.<component>` entry
    #[must_use]
    pub fn api_version_entry(&self, component: &str) -> Option<&Map<String, Value>> {
        self.context_entry("api_versions")?
            .get(component)?
            .as_object()
    }

    fn section(&self, name: &str) -> &Map<String, Value> {
        static EMPTY: Lazy<Map<String, Value>> = Lazy::new(Map::new);
        self.value
            .get(name)
            .and_then(Value::as_object)
            .unwrap_or(&*EMPTY)
    }
}

/// Validation runner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Platform whose user credentials legacy rules fan out over
    pub platform: String,
    /// Namespace searched when a rule is not found in the scenario namespace
    pub fallback_namespace: String,
}

impl RunnerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With platform
    #[inline]
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// With fallback namespace
    #[inline]
    #[must_use]
    pub fn with_fallback_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.fallback_namespace = namespace.into();
        self
    }

    /// Parse from JSON string
    ///
    /// # Errors
    /// Returns error if JSON is invalid
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from YAML string
    ///
    /// # Errors
    /// Returns error if YAML is invalid
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            fallback_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}
