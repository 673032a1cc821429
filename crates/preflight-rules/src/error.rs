//! Error types for built-in rules
//!
//! These are structural problems in scenario input. Rules surface them as
//! [`ValidationError::Structural`](preflight_core::ValidationError::Structural)
//! or translate them into invalid outcomes, never both.

use preflight_core::ClientError;

/// Structural violations in a command-specification mapping
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Command is not a mapping at all
    #[error("Command must be a dictionary")]
    NotAMapping,

    /// Both script sources given alongside an interpreter
    #[error("Exactly one of script_inline or script_file with interpreter is expected: {0}")]
    AmbiguousScript(String),

    /// Uploaded interpreter does not match the remote path
    #[error("When uploading an interpreter its path should be as well specified as the `remote_path' string: {0}")]
    InterpreterMismatch(String),

    /// Neither interpreter nor remote path given
    #[error("Supplied dict specifies no command to execute, either interpreter or remote_path is required: {0}")]
    NoCommand(String),

    /// Keys outside the accepted set
    #[error("Unexpected command parameters: {}", .0.join(", "))]
    UnexpectedKeys(Vec<String>),
}

/// Errors resolving a resource spec to a concrete resource
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    /// Nothing matched
    #[error("{kind} '{spec}' not found")]
    NotFound {
        /// Resource kind, e.g. `image`
        kind: String,
        /// Spec as written in the scenario arguments
        spec: String,
    },

    /// More than one resource matched
    #[error("{count} {kind} resources match '{spec}'")]
    Ambiguous {
        /// Resource kind
        kind: String,
        /// Spec as written in the scenario arguments
        spec: String,
        /// Number of matches
        count: usize,
    },

    /// Spec is neither an id, a name nor a regex
    #[error("invalid {kind} spec: {reason}")]
    InvalidSpec {
        /// Resource kind
        kind: String,
        /// Why the spec was rejected
        reason: String,
    },

    /// Listing candidates failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ResourceError {
    /// Create not-found error
    pub fn not_found(kind: impl Into<String>, spec: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            spec: spec.into(),
        }
    }

    /// Create invalid-spec error
    pub fn invalid_spec(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSpec {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// Client failure that must not be reported as a miss
    ///
    /// Everything else, including client-side lookup misses, counts as the
    /// resource not being there.
    #[must_use]
    pub fn into_client_error(self) -> Option<ClientError> {
        match self {
            Self::Client(e) if !e.is_not_found() => Some(e),
            _ => None,
        }
    }
}

/// Missing credentials for rules that need a live client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    /// Rule needs the admin credential and the deployment has none
    #[error("no admin credential for platform '{0}'")]
    NoAdmin(String),

    /// Rule needs clients and neither a user nor an admin credential exists
    #[error("rule '{0}' needs client access but the deployment has no credentials")]
    NoClients(String),
}
