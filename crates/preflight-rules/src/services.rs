//! Service availability rules

use crate::value::{admin_credential, display, with_clients};
use preflight_core::{
    ClientError, ClientHandleSet, ClientResult, Outcome, RuleArgs, RuleInput, RuleResult,
    ValidationError,
};

/// Legacy network service, only visible in the admin compute service list
pub const NOVA_NETWORK: &str = "nova-network";

/// `required_services(*services)`
///
/// A service declared in `context.api_versions.<service>` with a
/// `service_type` or `service_name` is set up by that context and skipped.
pub(crate) fn required_services(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let required: Vec<String> = args.rest_from(0).iter().map(display).collect();

    let mut available: Vec<String> =
        with_clients(input, |clients| Ok(clients.services()?.into_values().collect()))?;

    if required.iter().any(|s| s == NOVA_NETWORK) {
        let admin = admin_credential(input.deployment, input.platform)
            .map_err(ValidationError::structural)?
            .clients();
        let enabled = admin
            .compute()?
            .services()?
            .iter()
            .any(|s| s.binary == NOVA_NETWORK && s.status == "enabled");
        if enabled {
            available.push(NOVA_NETWORK.to_string());
        }
    }

    for service in &required {
        let configured_by_context = input
            .config
            .api_version_entry(service)
            .is_some_and(|entry| {
                entry.contains_key("service_type") || entry.contains_key("service_name")
            });
        if !available.contains(service) && !configured_by_context {
            return Ok(Outcome::invalid(format!(
                "'{service}' service is not available. Hint: If '{service}' service has \
                 non-default service_type, try to setup it via 'api_versions' context."
            )));
        }
    }
    Ok(Outcome::Valid)
}

/// `required_cinder_services(service_name)`
///
/// Needs the admin credential: the block storage service list is admin-only.
pub(crate) fn required_cinder_services(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let service_name = args.require_str("service_name", 0)?;
    let admin = admin_credential(input.deployment, input.platform)
        .map_err(ValidationError::structural)?
        .clients();

    let up = admin
        .block_storage()?
        .services()?
        .iter()
        .any(|s| s.binary == service_name && s.state == "up");
    Ok(Outcome::check(up, || {
        format!("{service_name} service is not available")
    }))
}

/// Whether the accessor serving `component` is available; `None` for unknown names
fn client_for(clients: &dyn ClientHandleSet, component: &str) -> Option<ClientResult<()>> {
    let reachable = match component {
        "nova" | "compute" => clients.compute().map(drop),
        "glance" | "image" => clients.image().map(drop),
        "cinder" | "block_storage" | "block-storage" | "volume" => {
            clients.block_storage().map(drop)
        }
        "heat" | "orchestration" => clients.orchestration().map(drop),
        "keystone" | "identity" => clients.identity().map(drop),
        "neutron" | "network" => clients.network().map(drop),
        _ => return None,
    };
    Some(reachable)
}

/// `required_clients(*components, admin = false)`
///
/// With `admin`, the platform admin's clients are checked instead of the
/// user's.
pub(crate) fn required_clients(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let components: Vec<String> = args.rest_from(0).iter().map(display).collect();
    let admin = args.bool_or("admin", usize::MAX, false)?;

    let check = |clients: &dyn ClientHandleSet| -> RuleResult<Outcome> {
        for component in &components {
            match client_for(clients, component) {
                Some(Ok(())) => {}
                None | Some(Err(ClientError::Unsupported(_))) => {
                    return Ok(Outcome::invalid(format!(
                        "Client for {component} is not available"
                    )))
                }
                Some(Err(e)) => return Err(e.into()),
            }
        }
        Ok(Outcome::Valid)
    };

    if admin {
        let admin = admin_credential(input.deployment, input.platform)
            .map_err(ValidationError::structural)?
            .clients();
        return check(&*admin);
    }
    with_clients(input, check)
}
