//! Helpers for loosely-typed scenario arguments

use preflight_core::{
    ClientHandleSet, Credential, Deployment, RuleInput, RuleResult, ValidationError,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::CredentialError;

/// Truthiness of a scenario argument
///
/// Templated task files often leave keys present with empty values, so
/// rules test values rather than key presence.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value for operator-facing messages (strings unquoted)
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Admin credential of `platform`
pub(crate) fn admin_credential(
    deployment: &dyn Deployment,
    platform: &str,
) -> Result<Arc<dyn Credential>, CredentialError> {
    deployment
        .credentials_for(platform)
        .admin
        .ok_or_else(|| CredentialError::NoAdmin(platform.to_string()))
}

/// Run `f` with the user's clients, or the platform admin's when no user was fanned out
pub(crate) fn with_clients<T>(
    input: &RuleInput<'_>,
    f: impl FnOnce(&dyn ClientHandleSet) -> RuleResult<T>,
) -> RuleResult<T> {
    if let Some(clients) = input.clients {
        return f(clients);
    }
    let admin = input
        .deployment
        .credentials_for(input.platform)
        .admin
        .ok_or_else(|| {
            ValidationError::structural(CredentialError::NoClients(input.rule.to_string()))
        })?;
    let clients = admin.clients();
    f(&*clients)
}
