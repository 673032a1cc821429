//! API version rule

use crate::value::{display, with_clients};
use preflight_core::{ArgumentError, Outcome, RuleArgs, RuleInput, RuleResult};
use serde_json::Value;

/// Component whose version is read from the client's capabilities
pub const IDENTITY: &str = "identity";

/// `required_api_versions(component, versions)`
pub(crate) fn required_api_versions(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let component = args.require_str("component", 0)?;
    let versions: Vec<String> = match args.require("versions", 1)? {
        Value::Array(items) => items.iter().map(display).collect(),
        other => {
            return Err(ArgumentError::invalid(
                "versions",
                format!("expected list of versions, got {other}"),
            )
            .into())
        }
    };
    let mismatch = |found: &str| {
        Outcome::invalid(format!(
            "Task was designed to be used with {component} V{}, but V{found} is selected.",
            versions.join(", ")
        ))
    };
    let accepts = |version: &str| versions.iter().any(|v| v == version);

    with_clients(input, |clients| {
        if component == IDENTITY {
            let identity = clients.identity()?;
            if !accepts("2.0") && identity.exposes_tenants() {
                return Ok(mismatch("2.0"));
            }
            if !accepts("3") && identity.exposes_projects() {
                return Ok(mismatch("3"));
            }
            return Ok(Outcome::Valid);
        }

        let declared = input
            .config
            .api_version_entry(component)
            .and_then(|entry| entry.get("version"))
            .filter(|v| !v.is_null())
            .map(display);
        let used = match declared {
            Some(version) => Some(version),
            None => clients.choose_version(component)?,
        };

        Ok(match used.filter(|v| !v.is_empty()) {
            None => Outcome::invalid("Unable to determine the API version."),
            Some(version) if accepts(&version) => Outcome::Valid,
            Some(version) => mismatch(&version),
        })
    })
}
