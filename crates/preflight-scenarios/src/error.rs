//! Error types for the scenario catalog

use preflight_core::{ClientError, RegistryError, ValidationError};

/// Errors from catalog registration, argument preparation and scenario runs
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Attached rule does not resolve
    #[error("scenario '{scenario}' cannot be registered: {source}")]
    Registry {
        /// Scenario being registered
        scenario: String,
        /// Resolution failure of the first unresolved rule
        #[source]
        source: RegistryError,
    },

    /// Scenario name already registered
    #[error("scenario '{0}' is already registered")]
    Duplicate(String),

    /// Scenario name not in the catalog
    #[error("unknown scenario '{0}'")]
    Unknown(String),

    /// Pre-run validation aborted with a hard error
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Argument conversion failed
    #[error("cannot convert argument '{arg}': {reason}")]
    Conversion {
        /// Argument being converted
        arg: String,
        /// Why the conversion failed
        reason: String,
    },

    /// Scenario arguments do not match the scenario's parameters
    #[error("invalid scenario arguments: {0}")]
    Arguments(#[from] serde_json::Error),

    /// Service call failed
    #[error("service error: {0}")]
    Service(#[from] ClientError),

    /// Post-condition of a scenario body did not hold
    #[error("assertion failed: {0}")]
    Assertion(String),
}

impl ScenarioError {
    /// Create conversion error
    pub fn conversion(arg: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Conversion {
            arg: arg.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for scenario operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;
