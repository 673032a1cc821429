//! Deprecated attachment shims
//!
//! Scenarios written against the old validator names keep building through
//! [`DeprecatedValidators`]. Each shim attaches the replacement rule and logs
//! a deprecation warning naming the scenario.

use preflight_core::{RuleArgs, ScenarioBuilder, DEFAULT_PLATFORM};

/// Release the old validator names were deprecated in
pub const DEPRECATED_SINCE: &str = "0.10.0";

/// Old-style attachment methods on [`ScenarioBuilder`]
pub trait DeprecatedValidators: Sized {
    /// `required_platform` with the platform defaulting to the cloud platform
    #[must_use]
    fn required_openstack(self, args: RuleArgs) -> Self;

    /// Attach `number`
    #[must_use]
    fn number(self, args: RuleArgs) -> Self;

    /// Attach `image_exists`
    #[must_use]
    fn image_exists(self, args: RuleArgs) -> Self;

    /// Attach `external_network_exists`
    #[must_use]
    fn external_network_exists(self, args: RuleArgs) -> Self;

    /// Attach `required_neutron_extensions`
    #[must_use]
    fn required_neutron_extensions(self, args: RuleArgs) -> Self;

    /// Attach `image_valid_on_flavor`
    #[must_use]
    fn image_valid_on_flavor(self, args: RuleArgs) -> Self;

    /// Attach `required_clients`
    #[must_use]
    fn required_clients(self, args: RuleArgs) -> Self;
}

impl DeprecatedValidators for ScenarioBuilder {
    fn required_openstack(self, args: RuleArgs) -> Self {
        let args = if args.keyword().contains_key("platform") {
            args
        } else {
            args.kw("platform", DEFAULT_PLATFORM)
        };
        self.attach_deprecated("required_platform", "required_openstack", DEPRECATED_SINCE, args)
    }

    fn number(self, args: RuleArgs) -> Self {
        self.attach_deprecated("number", "number", DEPRECATED_SINCE, args)
    }

    fn image_exists(self, args: RuleArgs) -> Self {
        self.attach_deprecated("image_exists", "image_exists", DEPRECATED_SINCE, args)
    }

    fn external_network_exists(self, args: RuleArgs) -> Self {
        self.attach_deprecated(
            "external_network_exists",
            "external_network_exists",
            DEPRECATED_SINCE,
            args,
        )
    }

    fn required_neutron_extensions(self, args: RuleArgs) -> Self {
        self.attach_deprecated(
            "required_neutron_extensions",
            "required_neutron_extensions",
            DEPRECATED_SINCE,
            args,
        )
    }

    fn image_valid_on_flavor(self, args: RuleArgs) -> Self {
        self.attach_deprecated(
            "image_valid_on_flavor",
            "image_valid_on_flavor",
            DEPRECATED_SINCE,
            args,
        )
    }

    fn required_clients(self, args: RuleArgs) -> Self {
        self.attach_deprecated("required_clients", "required_clients", DEPRECATED_SINCE, args)
    }
}
