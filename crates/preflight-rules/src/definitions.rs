//! Rules over definition files referenced by scenario arguments
//!
//! Orchestration templates and workflow workbooks are read from disk, so a
//! path that does not exist is an invalid outcome, while a file that cannot
//! be read after it was found is an I/O error.

use crate::files::{expand_home, file_access_ok, AccessMode};
use crate::value::{display, is_truthy, with_clients};
use preflight_core::{
    ArgumentError, ClientError, Outcome, RuleArgs, RuleInput, RuleResult, ValidationError,
};
use serde_json::Value;
use std::fs;

/// `validate_heat_template(*param_names)`
pub(crate) fn validate_heat_template(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let param_names: Vec<String> = args.rest_from(0).iter().map(display).collect();
    if param_names.is_empty() {
        return Err(ArgumentError::Missing("param_names".to_string()).into());
    }

    with_clients(input, |clients| {
        for param_name in &param_names {
            let path = input
                .config
                .arg(param_name)
                .and_then(Value::as_str)
                .filter(|p| !p.is_empty());
            let Some(path) = path else {
                return Ok(Outcome::invalid(format!(
                    "Path to heat template is not specified. Its needed for heat template \
                     validation. Please check the content of `{param_name}` scenario argument."
                )));
            };

            let path = expand_home(path);
            if !path.exists() {
                return Ok(Outcome::invalid(format!(
                    "No file found by the given path {}",
                    path.display()
                )));
            }
            let template =
                fs::read_to_string(&path).map_err(|e| ValidationError::io_error(&path, e))?;

            if let Err(e) = clients.orchestration()?.validate_template(&template) {
                let message = match e {
                    ClientError::Api(message) => message,
                    other => other.to_string(),
                };
                return Ok(Outcome::invalid(format!(
                    "Heat template validation failed on {}. Original error message: {message}.",
                    path.display()
                )));
            }
        }
        Ok(Outcome::Valid)
    })
}

/// `workbook_contains_workflow(workbook, workflow_name)`
///
/// Only checked when the workflow argument is set.
pub(crate) fn workbook_contains_workflow(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let config = input.config;
    let workbook_param = args.require_str("workbook", 0)?;
    let workflow_param = args.require_str("workflow_name", 1)?;

    let Some(workflow) = config.arg(workflow_param).filter(|v| is_truthy(v)) else {
        return Ok(Outcome::Valid);
    };
    let workflow = display(workflow);

    let workbook = config.arg(workbook_param).and_then(Value::as_str);
    let access = file_access_ok(workbook, AccessMode::READ, workbook_param, true);
    let Some(workbook) = workbook.filter(|_| access.is_valid()) else {
        return Ok(access);
    };

    let path = expand_home(workbook);
    let text = fs::read_to_string(&path).map_err(|e| ValidationError::io_error(&path, e))?;
    let definition: Value = serde_yaml::from_str(&text).map_err(ValidationError::structural)?;

    let listed = definition
        .get("workflows")
        .and_then(Value::as_object)
        .is_some_and(|workflows| workflows.contains_key(&workflow));
    Ok(Outcome::check(listed, || {
        format!("workflow '{workflow}' not found in the definition '{definition}'")
    }))
}
