//! Error types for the validation core
//!
//! Expected validation failures are never errors: they are
//! [`Outcome::Invalid`](crate::Outcome::Invalid) values. The types here cover
//! the remaining categories:
//! - Registry misconfiguration (unknown or duplicate rule keys)
//! - Malformed rule arguments and configurations
//! - Collaborator failures other than lookup misses

use std::path::PathBuf;

/// Errors raised by [`RuleRegistry`](crate::RuleRegistry)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No rule registered under the key
    #[error("rule '{name}' is not registered in namespace '{namespace}'")]
    NotFound {
        /// Namespace searched first
        namespace: String,
        /// Rule name
        name: String,
    },

    /// A rule is already registered under the key
    #[error("rule '{name}' is already registered in namespace '{namespace}'")]
    Conflict {
        /// Namespace of the existing rule
        namespace: String,
        /// Rule name
        name: String,
    },
}

impl RegistryError {
    /// Create not-found error
    pub fn not_found(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Create conflict error
    pub fn conflict(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Conflict {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Errors raised by collaborator clients
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Looked-up resource does not exist
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Resource kind, e.g. `flavor`
        kind: String,
        /// Requested id
        id: String,
    },

    /// Handle set does not provide the requested service client
    #[error("service client '{0}' is not available")]
    Unsupported(String),

    /// Any other API failure
    #[error("api error: {0}")]
    Api(String),
}

impl ClientError {
    /// Create not-found error
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Check if error is a lookup miss
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors reading bound rule arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// Required argument was not bound
    #[error("missing required argument '{0}'")]
    Missing(String),

    /// Argument was bound with the wrong shape
    #[error("invalid argument '{argument}': {reason}")]
    Invalid {
        /// Parameter name
        argument: String,
        /// What was wrong with the bound value
        reason: String,
    },
}

impl ArgumentError {
    /// Create invalid-argument error
    pub fn invalid(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

/// Errors loading configurations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON could not be parsed
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// YAML could not be parsed
    #[error("invalid yaml: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Document root (or a required section) is not a mapping
    #[error("{0} must be a mapping")]
    NotAMapping(String),
}

/// Hard errors from rules and the runner
///
/// These abort the whole validation pass and are never downgraded to an
/// invalid outcome.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Unknown rule or duplicate registration
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Rule was bound with missing or malformed arguments
    #[error("argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// Configuration section has an unexpected shape
    #[error("malformed configuration: {0}")]
    MalformedConfig(String),

    /// Rule-specific structural error in scenario input
    #[error("{0}")]
    Structural(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Collaborator failed with something other than a handled miss
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Filesystem error while inspecting scenario input
    #[error("io error reading {path}: {source}")]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Error raised while evaluating a named rule
    #[error("rule '{rule}' failed: {source}")]
    InRule {
        /// Name the rule was attached under
        rule: String,
        /// Error raised by the rule
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Wrap a rule-specific structural error
    pub fn structural<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Structural(Box::new(error))
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the failing rule name
    #[must_use]
    pub fn in_rule(self, rule: impl Into<String>) -> Self {
        match self {
            already @ Self::InRule { .. } => already,
            other => Self::InRule {
                rule: rule.into(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, skipping rule-name wrappers
    #[must_use]
    pub fn root(&self) -> &ValidationError {
        match self {
            Self::InRule { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for rule evaluation
pub type RuleResult<T> = Result<T, ValidationError>;

/// Result type alias for collaborator calls
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::not_found("cloud", "missing");
        assert_eq!(
            err.to_string(),
            "rule 'missing' is not registered in namespace 'cloud'"
        );
    }

    #[test]
    fn client_error_not_found() {
        let err = ClientError::not_found("flavor", "m1.tiny");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "flavor 'm1.tiny' not found");
        assert!(!ClientError::Api("boom".to_string()).is_not_found());
    }

    #[test]
    fn in_rule_wraps_once() {
        let err = ValidationError::from(ArgumentError::Missing("param_name".to_string()))
            .in_rule("file_exists")
            .in_rule("outer");
        match &err {
            ValidationError::InRule { rule, .. } => assert_eq!(rule, "file_exists"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root(), ValidationError::Argument(_)));
    }

    #[test]
    fn error_conversions() {
        let err: ValidationError = RegistryError::conflict("default", "x").into();
        assert!(matches!(err, ValidationError::Registry(_)));

        let err: ValidationError = ClientError::Unsupported("image".to_string()).into();
        assert!(matches!(err, ValidationError::Client(_)));
    }
}
