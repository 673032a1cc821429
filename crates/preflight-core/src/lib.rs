//! Preflight Core
//!
//! Declarative pre-run validation for benchmark scenarios.
//!
//! # Core Concepts
//!
//! - [`Rule`]: a named predicate over a scenario configuration
//! - [`RuleRegistry`]: `(namespace, name)` → rule implementation
//! - [`ScenarioBuilder`]: attaches rules (with bound [`RuleArgs`]) to a
//!   [`ScenarioDescriptor`] at definition time
//! - [`LegacyRule`]: lifts failure-only check functions into rules, fanning
//!   out over every user credential of the validated platform
//! - [`ValidationRunner`]: evaluates attached rules in order, stopping at the
//!   first [`Outcome::Invalid`]
//!
//! # Architecture
//!
//! ```text
//! definition time:  ScenarioBuilder ──validator(rule, args)──▶ ScenarioDescriptor
//! startup:          register(namespace, name, rule) ─────────▶ RuleRegistry
//! run time:         ValidationRunner ─ resolve ─▶ Rule::evaluate ─▶ Outcome (fail-fast)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use preflight_core::{RuleRegistry, RunnerConfig, ScenarioConfig, ValidationRunner};
//!
//! let registry: RuleRegistry = build_registry();
//! let runner = ValidationRunner::new(&registry, RunnerConfig::new());
//!
//! let config = ScenarioConfig::from_yaml(task_yaml)?;
//! let outcome = runner.validate(&scenario, &config, &deployment, None)?;
//! if let Some(message) = outcome.message() {
//!     eprintln!("{message}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod args;
pub mod clients;
pub mod config;
pub mod error;
pub mod legacy;
pub mod outcome;
pub mod registry;
pub mod rule;
pub mod runner;
pub mod scenario;

// Re-exports
pub use args::RuleArgs;
pub use clients::{
    BlockStorageClient, ClientHandleSet, ComputeClient, Credential, Deployment, Flavor,
    IdentityClient, Image, ImageClient, Network, NetworkClient, OrchestrationClient,
    PlatformCredentials, ServiceStatus, VolumeType,
};
pub use config::{RunnerConfig, ScenarioConfig, DEFAULT_NAMESPACE, DEFAULT_PLATFORM};
pub use error::{
    ArgumentError, ClientError, ClientResult, ConfigError, RegistryError, RuleResult,
    ValidationError,
};
pub use legacy::LegacyRule;
pub use outcome::{IntoOutcome, Outcome};
pub use registry::{RuleKey, RuleRegistry};
pub use rule::{FnRule, Rule, RuleInput};
pub use runner::ValidationRunner;
pub use scenario::{
    attach, ArgConversion, ArgKind, ScenarioBuilder, ScenarioDescriptor, ValidatorEntry,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing and running rules
    pub use crate::{
        attach, ClientHandleSet, Deployment, LegacyRule, Outcome, Rule, RuleArgs, RuleInput,
        RuleRegistry, RuleResult, RunnerConfig, ScenarioConfig, ScenarioDescriptor,
        ValidationError, ValidationRunner,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
