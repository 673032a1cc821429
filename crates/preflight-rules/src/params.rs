//! Scenario argument rules

use crate::value::display;
use preflight_core::{
    ArgumentError, Outcome, Rule, RuleArgs, RuleInput, RuleResult, ValidationError,
};
use serde_json::Value;

/// `restricted_parameters(param_names, subdict = None)`
///
/// Fails when any named parameter is set in `args`, or in `args.<subdict>`
/// when a sub-mapping is given.
pub(crate) fn restricted_parameters(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let config = input.config;
    let param_names = args.str_list("param_names", 0)?;
    let subdict = args.opt_str("subdict", 1)?;

    let target = match subdict {
        Some(key) => match config.arg(key) {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(ValidationError::MalformedConfig(format!(
                    "args.{key} must be a mapping, got {other}"
                )))
            }
        },
        None => Some(config.args()),
    };

    let restricted: Vec<&str> = param_names
        .iter()
        .filter(|name| target.is_some_and(|map| map.contains_key(name.as_str())))
        .map(String::as_str)
        .collect();

    Ok(Outcome::check(restricted.is_empty(), || {
        format!(
            "You can't specify parameters '{}' in '{}'",
            restricted.join(", "),
            subdict.unwrap_or("args")
        )
    }))
}

/// Share protocols a share can be created with
pub const SHARE_PROTOCOLS: [&str; 4] = ["NFS", "CIFS", "GLUSTERFS", "HDFS"];

/// `validate_share_proto()`
pub(crate) fn validate_share_proto(
    input: &RuleInput<'_>,
    _args: &RuleArgs,
) -> RuleResult<Outcome> {
    let share_proto = display(input.config.arg("share_proto").unwrap_or(&Value::Null));
    Ok(Outcome::check(
        SHARE_PROTOCOLS.contains(&share_proto.to_uppercase().as_str()),
        || {
            format!(
                "Share protocol '{share_proto}' is invalid, allowed values are '{}'.",
                SHARE_PROTOCOLS.join("', '")
            )
        },
    ))
}

/// Numeric bounds on a scenario argument
///
/// Arguments: `param_name`, `minval`, `maxval`, `nullable` (default false),
/// `integer_only` (default false).
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberRule;

impl NumberRule {
    fn bound(args: &RuleArgs, name: &str, position: usize) -> Result<Option<f64>, ArgumentError> {
        args.get(name, position)
            .map(|v| {
                v.as_f64().ok_or_else(|| {
                    ArgumentError::invalid(name, format!("expected number, got {v}"))
                })
            })
            .transpose()
    }
}

impl Rule for NumberRule {
    fn evaluate(&self, input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
        let param_name = args.require_str("param_name", 0)?;
        let minval = Self::bound(args, "minval", 1)?;
        let maxval = Self::bound(args, "maxval", 2)?;
        let nullable = args.bool_or("nullable", 3, false)?;
        let integer_only = args.bool_or("integer_only", 4, false)?;

        let value = input.config.arg(param_name).unwrap_or(&Value::Null);
        let shown = display(value);

        if integer_only && value.is_f64() {
            return Ok(Outcome::invalid(format!(
                "{param_name} is {shown} which hasn't int type"
            )));
        }
        if nullable && value.is_null() {
            return Ok(Outcome::Valid);
        }

        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if integer_only => s.trim().parse::<i64>().ok().map(|i| i as f64),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        let Some(number) = number else {
            let kind = if integer_only { "int" } else { "float" };
            return Ok(Outcome::invalid(format!(
                "{param_name} is {shown} which is not a valid {kind}"
            )));
        };

        if let Some(min) = minval.filter(|min| number < *min) {
            return Ok(Outcome::invalid(format!(
                "{param_name} is {shown} which is less than the minimum ({min})"
            )));
        }
        if let Some(max) = maxval.filter(|max| number > *max) {
            return Ok(Outcome::invalid(format!(
                "{param_name} is {shown} which is greater than the maximum ({max})"
            )));
        }
        Ok(Outcome::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_test_utils::{scenario_config, FakeDeployment};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn restricted(config: Value, args: RuleArgs) -> Outcome {
        let config = scenario_config(config);
        let deployment = FakeDeployment::new();
        let input = RuleInput::new(&config, &deployment, "cloud", "restricted_parameters");
        restricted_parameters(&input, &args).unwrap()
    }

    #[test]
    fn restricted_in_args() {
        assert_eq!(
            restricted(json!({"args": {"name": "x"}}), RuleArgs::new().arg("name")),
            Outcome::invalid("You can't specify parameters 'name' in 'args'")
        );
        assert!(restricted(json!({"args": {}}), RuleArgs::new().arg("name")).is_valid());
    }

    #[test]
    fn restricted_in_subdict_lists_every_offender() {
        let config = json!({"args": {"kwargs": {"name": 1, "image_name": 2, "size": 3}}});
        let args = RuleArgs::new()
            .arg(json!(["image_name", "name", "disk"]))
            .kw("subdict", "kwargs");
        assert_eq!(
            restricted(config, args),
            Outcome::invalid("You can't specify parameters 'image_name, name' in 'kwargs'")
        );
    }

    #[test]
    fn missing_subdict_passes() {
        let args = RuleArgs::new().arg("name").kw("subdict", "kwargs");
        assert!(restricted(json!({"args": {"name": "x"}}), args).is_valid());
    }

    #[test]
    fn share_protocol_is_case_insensitive() {
        let deployment = FakeDeployment::new();
        let check = |config: Value| {
            let config = scenario_config(config);
            let input = RuleInput::new(&config, &deployment, "cloud", "validate_share_proto");
            validate_share_proto(&input, &RuleArgs::new()).unwrap()
        };
        assert!(check(json!({"args": {"share_proto": "nfs"}})).is_valid());
        assert_eq!(
            check(json!({"args": {"share_proto": "ftp"}})),
            Outcome::invalid(
                "Share protocol 'ftp' is invalid, allowed values are 'NFS', 'CIFS', 'GLUSTERFS', 'HDFS'."
            )
        );
        assert!(!check(json!({"args": {}})).is_valid());
    }

    fn number(value: Value, args: RuleArgs) -> Outcome {
        let config = scenario_config(json!({"args": {"times": value}}));
        let deployment = FakeDeployment::new();
        let input = RuleInput::new(&config, &deployment, "cloud", "number");
        NumberRule.evaluate(&input, &args).unwrap()
    }

    #[test]
    fn number_bounds() {
        let args = || RuleArgs::new().arg("times").kw("minval", 1).kw("maxval", 10);
        assert!(number(json!(5), args()).is_valid());
        assert_eq!(
            number(json!(0), args()),
            Outcome::invalid("times is 0 which is less than the minimum (1)")
        );
        assert_eq!(
            number(json!(11), args()),
            Outcome::invalid("times is 11 which is greater than the maximum (10)")
        );
    }

    #[test]
    fn number_integer_only_and_nullable() {
        let ints = || RuleArgs::new().arg("times").kw("integer_only", true);
        assert_eq!(
            number(json!(1.5), ints()),
            Outcome::invalid("times is 1.5 which hasn't int type")
        );
        assert!(number(json!("3"), ints()).is_valid());
        assert_eq!(
            number(json!("abc"), ints()),
            Outcome::invalid("times is abc which is not a valid int")
        );
        assert!(number(json!(null), RuleArgs::new().arg("times").kw("nullable", true)).is_valid());
    }
}
