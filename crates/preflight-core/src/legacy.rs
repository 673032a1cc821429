//! Legacy check adapter
//!
//! Older checks only report failures and expect to run once per user.
//! [`LegacyRule`] lifts such a function into a [`Rule`] and fans it out over
//! the platform's user credentials:
//!
//! - users present: one call per user, in order, with `input.clients` bound
//!   to that user's clients; the first invalid outcome is returned and later
//!   users are neither resolved nor checked
//! - no users: one call with `input.clients` unset
//!
//! Every call sees the platform the runner validates against, so checks that
//! fall back to admin credentials look them up on the same platform.
//! Hard errors propagate immediately in both cases.

use crate::args::RuleArgs;
use crate::error::RuleResult;
use crate::outcome::{IntoOutcome, Outcome};
use crate::rule::{Rule, RuleInput};
use std::fmt;

/// Adapter from a legacy check function to [`Rule`]
pub struct LegacyRule<F> {
    name: &'static str,
    check: F,
}

impl<F, R> LegacyRule<F>
where
    F: Fn(&RuleInput<'_>, &RuleArgs) -> RuleResult<R> + Send + Sync,
    R: IntoOutcome,
{
    /// Wrap a legacy check
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, check: F) -> Self {
        Self { name, check }
    }

    /// Name the check was written under
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn run_check(&self, input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
        (self.check)(input, args).map(IntoOutcome::into_outcome)
    }
}

impl<F> fmt::Debug for LegacyRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyRule").field("name", &self.name).finish()
    }
}

impl<F, R> Rule for LegacyRule<F>
where
    F: Fn(&RuleInput<'_>, &RuleArgs) -> RuleResult<R> + Send + Sync,
    R: IntoOutcome,
{
    fn evaluate(&self, input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
        let users = input.deployment.credentials_for(input.platform).users;

        if users.is_empty() {
            tracing::trace!(
                rule = self.name,
                platform = input.platform,
                "no user credentials; running without clients"
            );
            let unbound = RuleInput {
                clients: None,
                ..*input
            };
            return self.run_check(&unbound, args);
        }

        for (index, user) in users.iter().enumerate() {
            let clients = user.clients();
            tracing::debug!(rule = self.name, credential = index, "running check for user");
            let outcome = self.run_check(&input.with_clients(&*clients), args)?;
            if !outcome.is_valid() {
                return Ok(outcome);
            }
        }
        Ok(Outcome::Valid)
    }
}
