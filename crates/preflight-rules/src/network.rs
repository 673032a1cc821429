//! Network rules

use crate::value::{display, is_truthy, with_clients};
use preflight_core::{Outcome, RuleArgs, RuleInput, RuleResult};

/// `external_network_exists(param_name)`
///
/// Only checked when the argument is set.
pub(crate) fn external_network_exists(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let param_name = args.require_str("param_name", 0)?;
    let Some(wanted) = input.config.arg(param_name).filter(|v| is_truthy(v)) else {
        return Ok(Outcome::Valid);
    };
    let wanted = display(wanted);

    with_clients(input, |clients| {
        let external: Vec<String> = clients
            .network()?
            .networks()?
            .into_iter()
            .filter(|net| net.external)
            .map(|net| net.name)
            .collect();
        Ok(Outcome::check(external.contains(&wanted), || {
            format!(
                "External (floating) network with name {wanted} not found. \
                 Available external networks: [{}]",
                external.join(", ")
            )
        }))
    })
}

/// `required_neutron_extensions(*extensions)`
pub(crate) fn required_neutron_extensions(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let required: Vec<String> = args.rest_from(0).iter().map(display).collect();

    with_clients(input, |clients| {
        let enabled = clients.network()?.extensions()?;
        Ok(required
            .iter()
            .find(|ext| !enabled.contains(ext))
            .map_or(Outcome::Valid, |ext| {
                Outcome::invalid(format!("Neutron extension {ext} is not configured"))
            }))
    })
}
