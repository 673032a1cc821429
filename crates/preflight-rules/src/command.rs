//! Command-specification checks
//!
//! A command mapping names what to run on a guest: either an interpreter
//! with a script (`script_file` or `script_inline`), or a `remote_path` to
//! execute directly. Shape violations are programmer errors and abort the
//! run; only unreadable local files are reported as invalid outcomes.

use crate::error::CommandError;
use crate::files::{file_access_ok, AccessMode};
use crate::value::is_truthy;
use preflight_core::{Outcome, RuleArgs, RuleInput, RuleResult, ValidationError};
use serde_json::Value;

const ALLOWED_KEYS: [&str; 6] = [
    "script_file",
    "script_inline",
    "interpreter",
    "remote_path",
    "local_path",
    "command_args",
];

/// Check the shape of a command-specification mapping
///
/// # Errors
/// Returns the first [`CommandError`] found
pub fn check_command_dict(command: &Value) -> Result<(), CommandError> {
    let Value::Object(map) = command else {
        return Err(CommandError::NotAMapping);
    };
    let truthy = |key: &str| map.get(key).is_some_and(is_truthy);

    if let Some(interpreter) = map.get("interpreter").filter(|v| is_truthy(v)) {
        if truthy("script_file") && map.contains_key("script_inline") {
            return Err(CommandError::AmbiguousScript(command.to_string()));
        }

        // Uploading a shell: the remote path must be the interpreter itself
        let interpreter = match interpreter {
            Value::Array(parts) => parts.last().unwrap_or(&Value::Null),
            single => single,
        };
        if truthy("local_path") && map.get("remote_path").unwrap_or(&Value::Null) != interpreter {
            return Err(CommandError::InterpreterMismatch(command.to_string()));
        }
    } else if !truthy("remote_path") {
        return Err(CommandError::NoCommand(command.to_string()));
    }

    let unexpected: Vec<String> = map
        .keys()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if unexpected.is_empty() {
        Ok(())
    } else {
        Err(CommandError::UnexpectedKeys(unexpected))
    }
}

/// `valid_command(param_name, required = true)`
pub(crate) fn valid_command(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let param_name = args.require_str("param_name", 0)?;
    let required = args.bool_or("required", 1, true)?;

    let command = input.config.arg(param_name).unwrap_or(&Value::Null);
    if command.is_null() && !required {
        return Ok(Outcome::Valid);
    }

    check_command_dict(command).map_err(ValidationError::structural)?;

    for key in ["script_file", "local_path"] {
        if let Some(path) = command.get(key).filter(|v| is_truthy(v)) {
            let path = path.as_str().ok_or_else(|| {
                ValidationError::MalformedConfig(format!("{param_name}.{key} must be a path"))
            })?;
            return Ok(file_access_ok(
                Some(path),
                AccessMode::READ,
                &format!("{param_name}.{key}"),
                true,
            ));
        }
    }
    Ok(Outcome::Valid)
}
