//! Preflight Rules
//!
//! The built-in rule library for cloud benchmark scenarios.
//!
//! # Namespaces
//!
//! | Namespace | Rules |
//! |---|---|
//! | `default` | `required_platform`, `number` |
//! | `cloud` | every client-backed check, each fanned out over user credentials |
//!
//! Scenarios in the `cloud` namespace reach the `default` rules through the
//! runner's fallback namespace.
//!
//! # Example
//!
//! ```rust,ignore
//! use preflight_core::{RunnerConfig, ValidationRunner};
//!
//! let registry = preflight_rules::default_registry()?;
//! let runner = ValidationRunner::new(registry, RunnerConfig::new());
//! let outcome = runner.validate(&scenario, &config, &deployment, None)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod api_versions;
pub mod command;
pub mod context;
pub mod definitions;
pub mod deprecated;
pub mod error;
pub mod files;
pub mod network;
pub mod params;
pub mod platform;
pub mod resource;
pub mod resources;
pub mod services;
mod value;

use once_cell::sync::Lazy;
use preflight_core::{
    LegacyRule, RegistryError, RuleRegistry, DEFAULT_NAMESPACE, DEFAULT_PLATFORM,
};

// Re-exports
pub use command::check_command_dict;
pub use deprecated::{DeprecatedValidators, DEPRECATED_SINCE};
pub use error::{CommandError, CredentialError, ResourceError};
pub use files::{expand_home, file_access_ok, AccessMode};
pub use params::NumberRule;
pub use platform::RequiredPlatform;
pub use resource::{Resource, ResourceSpec};

/// Namespace of the client-backed rules
pub const CLOUD_NAMESPACE: &str = DEFAULT_PLATFORM;

/// Register every built-in rule
///
/// # Errors
/// Returns [`RegistryError::Conflict`] if a built-in name is already taken
pub fn register_builtin_rules(registry: &mut RuleRegistry) -> Result<(), RegistryError> {
    registry.register(DEFAULT_NAMESPACE, "required_platform", RequiredPlatform)?;
    registry.register(DEFAULT_NAMESPACE, "number", NumberRule)?;

    macro_rules! legacy {
        ($($name:literal => $check:path),+ $(,)?) => {
            $(registry.register(CLOUD_NAMESPACE, $name, LegacyRule::new($name, $check))?;)+
        };
    }

    legacy! {
        "file_exists" => files::file_exists,
        "valid_command" => command::valid_command,
        "required_services" => services::required_services,
        "required_cinder_services" => services::required_cinder_services,
        "required_clients" => services::required_clients,
        "required_contexts" => context::required_contexts,
        "required_param_or_context" => context::required_param_or_context,
        "required_api_versions" => api_versions::required_api_versions,
        "restricted_parameters" => params::restricted_parameters,
        "validate_share_proto" => params::validate_share_proto,
        "flavor_exists" => resources::flavor_exists,
        "image_exists" => resources::image_exists,
        "image_valid_on_flavor" => resources::image_valid_on_flavor,
        "volume_type_exists" => resources::volume_type_exists,
        "external_network_exists" => network::external_network_exists,
        "required_neutron_extensions" => network::required_neutron_extensions,
        "validate_heat_template" => definitions::validate_heat_template,
        "workbook_contains_workflow" => definitions::workbook_contains_workflow,
    }

    tracing::debug!(rules = registry.len(), "registered built-in rules");
    Ok(())
}

/// Fresh registry holding the built-in rules
///
/// # Errors
/// See [`register_builtin_rules`]
pub fn builtin_registry() -> Result<RuleRegistry, RegistryError> {
    let mut registry = RuleRegistry::new();
    register_builtin_rules(&mut registry)?;
    Ok(registry)
}

static DEFAULT_REGISTRY: Lazy<Result<RuleRegistry, RegistryError>> = Lazy::new(builtin_registry);

/// Process-wide registry of built-in rules, built on first use
///
/// # Errors
/// See [`register_builtin_rules`]
pub fn default_registry() -> Result<&'static RuleRegistry, RegistryError> {
    match &*DEFAULT_REGISTRY {
        Ok(registry) => Ok(registry),
        Err(e) => Err(e.clone()),
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
