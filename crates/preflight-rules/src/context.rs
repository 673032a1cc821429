//! Context presence rules

use preflight_core::{ArgumentError, Outcome, RuleArgs, RuleInput, RuleResult, ScenarioConfig};
use serde_json::Value;

/// A required context, or a group of which at least one is required
#[derive(Debug, Clone, PartialEq, Eq)]
enum Requirement {
    One(String),
    AnyOf(Vec<String>),
}

impl Requirement {
    fn parse(value: &Value) -> Result<Self, ArgumentError> {
        let as_name = |v: &Value| {
            v.as_str().map(str::to_string).ok_or_else(|| {
                ArgumentError::invalid("context_names", format!("expected context name, got {v}"))
            })
        };
        match value {
            Value::Array(group) => group
                .iter()
                .map(as_name)
                .collect::<Result<_, _>>()
                .map(Self::AnyOf),
            single => as_name(single).map(Self::One),
        }
    }

    /// Operator-facing description when unmet, `None` when met
    fn missing_in(&self, config: &ScenarioConfig) -> Option<String> {
        let present = |name: &String| config.context_entry(name).is_some();
        match self {
            Self::One(name) => (!present(name)).then(|| name.clone()),
            Self::AnyOf(group) => (!group.iter().any(present)).then(|| {
                group
                    .iter()
                    .map(|name| format!("'{name}'"))
                    .collect::<Vec<_>>()
                    .join(" or ")
            }),
        }
    }
}

/// `required_contexts(*context_names)`
///
/// A list argument means "at least one of".
pub(crate) fn required_contexts(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let mut missing = Vec::new();
    for value in args.rest_from(0) {
        if let Some(description) = Requirement::parse(value)?.missing_in(input.config) {
            missing.push(description);
        }
    }

    Ok(Outcome::check(missing.is_empty(), || {
        format!(
            "The following contexts are required but missing from the benchmark \
             configuration file: {}",
            missing.join(", ")
        )
    }))
}

/// `required_param_or_context(arg_name, ctx_name)`
pub(crate) fn required_param_or_context(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let arg_name = args.require_str("arg_name", 0)?;
    let ctx_name = args.require_str("ctx_name", 1)?;

    let config = input.config;
    let found = config.context_entry(ctx_name).is_some() || config.args().contains_key(arg_name);
    Ok(Outcome::check(found, || {
        format!(
            "Parameter {arg_name} is required but not described into context {ctx_name} \
             or arguments of scenario"
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_test_utils::{scenario_config, FakeDeployment};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(
        rule: fn(&RuleInput<'_>, &RuleArgs) -> RuleResult<Outcome>,
        config: Value,
        args: &RuleArgs,
    ) -> RuleResult<Outcome> {
        let config = scenario_config(config);
        let deployment = FakeDeployment::new();
        rule(&RuleInput::new(&config, &deployment, "cloud", "contexts"), args)
    }

    fn contexts(context: Value) -> Outcome {
        let args = RuleArgs::new().arg("net").arg(json!(["a", "b"]));
        run(required_contexts, json!({"context": context}), &args).unwrap()
    }

    #[test]
    fn group_is_satisfied_by_any_member() {
        assert!(contexts(json!({"net": 1, "a": 1})).is_valid());
        assert!(contexts(json!({"net": 1, "b": {}})).is_valid());
    }

    #[test]
    fn missing_group_is_listed_as_alternatives() {
        assert_eq!(
            contexts(json!({"net": 1})),
            Outcome::invalid(
                "The following contexts are required but missing from the benchmark \
                 configuration file: 'a' or 'b'"
            )
        );
    }

    #[test]
    fn every_missing_requirement_is_listed() {
        assert_eq!(
            contexts(json!({})).message().unwrap(),
            "The following contexts are required but missing from the benchmark \
             configuration file: net, 'a' or 'b'"
        );
    }

    #[test]
    fn non_string_names_are_argument_errors() {
        assert!(run(required_contexts, json!({}), &RuleArgs::new().arg(1)).is_err());
    }

    #[test]
    fn param_or_context() {
        let args = RuleArgs::new().arg("image").arg("images");
        let check = |config: Value| run(required_param_or_context, config, &args).unwrap();
        assert!(check(json!({"args": {"image": "cirros"}})).is_valid());
        assert!(check(json!({"context": {"images": {}}})).is_valid());
        assert_eq!(
            check(json!({})),
            Outcome::invalid(
                "Parameter image is required but not described into context images \
                 or arguments of scenario"
            )
        );
    }
}
