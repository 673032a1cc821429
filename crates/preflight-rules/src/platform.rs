//! Platform credential requirements

use preflight_core::{Outcome, Rule, RuleArgs, RuleInput, RuleResult};

/// Requires admin and/or user credentials for a platform
///
/// Arguments: `platform` (defaults to the runner's platform), `admin`,
/// `users`. User credentials can be created on the fly when an admin
/// credential exists, so `users` is satisfied by either.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredPlatform;

impl Rule for RequiredPlatform {
    fn evaluate(&self, input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
        let platform = args.opt_str("platform", 0)?.unwrap_or(input.platform);
        let admin = args.bool_or("admin", 1, false)?;
        let users = args.bool_or("users", 2, false)?;

        if !(admin || users) {
            return Ok(Outcome::invalid(
                "You should specify admin=True or users=True or both.",
            ));
        }

        let credentials = input.deployment.credentials_for(platform);
        if admin && credentials.admin.is_none() {
            return Ok(Outcome::invalid(format!(
                "No admin credential for {platform}"
            )));
        }
        if users && credentials.users.is_empty() && credentials.admin.is_none() {
            return Ok(Outcome::invalid(format!(
                "No user credentials for {platform}"
            )));
        }
        Ok(Outcome::Valid)
    }
}
