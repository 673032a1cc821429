//! Integration tests for the validation runner

use preflight_core::{
    FnRule, LegacyRule, Outcome, RegistryError, RuleArgs, RuleInput, RuleRegistry, RuleResult,
    RunnerConfig, ScenarioConfig, ScenarioDescriptor, ValidationError, ValidationRunner,
    DEFAULT_NAMESPACE,
};
use preflight_test_utils::{
    init_test_tracing, scenario_config, FakeClients, FakeCredential, FakeDeployment,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn counting_rule(
    name: &'static str,
    outcome: Outcome,
    calls: Arc<AtomicUsize>,
) -> FnRule<impl Fn(&RuleInput<'_>, &RuleArgs) -> RuleResult<Outcome> + Send + Sync> {
    FnRule::new(name, move |_input: &RuleInput<'_>, _args: &RuleArgs| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(outcome.clone())
    })
}

fn empty_config() -> ScenarioConfig {
    scenario_config(json!({"args": {}, "context": {}}))
}

#[test]
fn test_all_rules_pass() {
    init_test_tracing();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = RuleRegistry::new();
    registry
        .register("cloud", "one", counting_rule("one", Outcome::Valid, calls.clone()))
        .unwrap();
    registry
        .register("cloud", "two", counting_rule("two", Outcome::Valid, calls.clone()))
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.pass")
        .namespace("cloud")
        .validator("one", RuleArgs::new())
        .validator("two", RuleArgs::new())
        .build();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    let outcome = runner
        .validate(&scenario, &empty_config(), &FakeDeployment::new(), None)
        .unwrap();

    assert_eq!(outcome, Outcome::Valid);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_first_failure_short_circuits() {
    init_test_tracing();
    let before = Arc::new(AtomicUsize::new(0));
    let failing = Arc::new(AtomicUsize::new(0));
    let after = Arc::new(AtomicUsize::new(0));

    let mut registry = RuleRegistry::new();
    registry
        .register("cloud", "ok", counting_rule("ok", Outcome::Valid, before.clone()))
        .unwrap();
    registry
        .register(
            "cloud",
            "broken",
            counting_rule("broken", Outcome::invalid("first problem"), failing.clone()),
        )
        .unwrap();
    registry
        .register(
            "cloud",
            "also_broken",
            counting_rule("also_broken", Outcome::invalid("second problem"), after.clone()),
        )
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.fail")
        .namespace("cloud")
        .validator("ok", RuleArgs::new())
        .validator("broken", RuleArgs::new())
        .validator("also_broken", RuleArgs::new())
        .build();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    let outcome = runner
        .validate(&scenario, &empty_config(), &FakeDeployment::new(), None)
        .unwrap();

    assert_eq!(outcome, Outcome::invalid("first problem"));
    assert_eq!(before.load(Ordering::SeqCst), 1);
    assert_eq!(failing.load(Ordering::SeqCst), 1);
    assert_eq!(after.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unknown_rule_is_a_registry_error() {
    let registry = RuleRegistry::new();
    let scenario = ScenarioDescriptor::builder("Dummy.unknown")
        .namespace("cloud")
        .validator("no_such_rule", RuleArgs::new())
        .build();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    let err = runner
        .validate(&scenario, &empty_config(), &FakeDeployment::new(), None)
        .unwrap_err();

    assert!(matches!(
        err,
        ValidationError::Registry(RegistryError::NotFound { ref name, .. }) if name == "no_such_rule"
    ));
    assert!(runner.check_attachments(&scenario).is_err());
}

#[test]
fn test_fallback_namespace_resolves_platform_agnostic_rules() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = RuleRegistry::new();
    registry
        .register(
            DEFAULT_NAMESPACE,
            "shared",
            counting_rule("shared", Outcome::Valid, calls.clone()),
        )
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.fallback")
        .namespace("cloud")
        .validator("shared", RuleArgs::new())
        .build();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    runner.check_attachments(&scenario).unwrap();
    assert!(runner
        .validate(&scenario, &empty_config(), &FakeDeployment::new(), None)
        .unwrap()
        .is_valid());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let strict = ValidationRunner::new(
        &registry,
        RunnerConfig::new().with_fallback_namespace("nowhere"),
    );
    assert!(strict.check_attachments(&scenario).is_err());
}

#[test]
fn test_rule_errors_carry_rule_name() {
    let mut registry = RuleRegistry::new();
    registry
        .register(
            "cloud",
            "needs_flavor",
            FnRule::new("needs_flavor", |_input: &RuleInput<'_>, args: &RuleArgs| {
                args.require_str("flavor", 0)?;
                Ok(Outcome::Valid)
            }),
        )
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.args")
        .namespace("cloud")
        .validator("needs_flavor", RuleArgs::new())
        .build();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    let err = runner
        .validate(&scenario, &empty_config(), &FakeDeployment::new(), None)
        .unwrap_err();

    match &err {
        ValidationError::InRule { rule, source } => {
            assert_eq!(rule, "needs_flavor");
            assert!(matches!(**source, ValidationError::Argument(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.to_string().contains("needs_flavor"));
}

#[test]
fn test_runner_passes_no_clients_and_forwards_inputs() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let mut registry = RuleRegistry::new();
    registry
        .register(
            "cloud",
            "inspect",
            FnRule::new("inspect", move |input: &RuleInput<'_>, args: &RuleArgs| {
                recorder.lock().unwrap().push((
                    input.clients.is_none(),
                    input.platform.to_string(),
                    input.rule.to_string(),
                    input.plugin_config.cloned(),
                    args.get("marker", 0).cloned(),
                ));
                Ok(Outcome::Valid)
            }),
        )
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.inspect")
        .namespace("cloud")
        .validator("inspect", RuleArgs::new().kw("marker", 7))
        .build();
    let plugin = json!({"runner": "constant"});

    let runner = ValidationRunner::new(&registry, RunnerConfig::new().with_platform("edge"));
    runner
        .validate(&scenario, &empty_config(), &FakeDeployment::new(), Some(&plugin))
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(
            true,
            "edge".to_string(),
            "inspect".to_string(),
            Some(plugin.clone()),
            Some(json!(7)),
        )]
    );
}

#[test]
fn test_legacy_rule_fans_out_through_runner() {
    init_test_tracing();
    let first = Arc::new(FakeCredential::new(FakeClients::new().with_service("image")));
    let second = Arc::new(FakeCredential::new(FakeClients::new()));
    let third = Arc::new(FakeCredential::new(FakeClients::new().with_service("image")));
    let deployment = FakeDeployment::new()
        .with_user("cloud", first.clone())
        .with_user("cloud", second.clone())
        .with_user("cloud", third.clone());

    let mut registry = RuleRegistry::new();
    registry
        .register(
            "cloud",
            "has_image_service",
            LegacyRule::new(
                "has_image_service",
                |input: &RuleInput<'_>, _: &RuleArgs| {
                    let services = match input.clients {
                        Some(clients) => clients.services()?,
                        None => return Ok(None),
                    };
                    Ok((!services.contains_key("image"))
                        .then(|| Outcome::invalid("image service is missing")))
                },
            ),
        )
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.legacy")
        .namespace("cloud")
        .validator("has_image_service", RuleArgs::new())
        .build();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    let outcome = runner
        .validate(&scenario, &empty_config(), &deployment, None)
        .unwrap();

    assert_eq!(outcome, Outcome::invalid("image service is missing"));
    assert_eq!(first.resolved(), 1);
    assert_eq!(second.resolved(), 1);
    assert_eq!(third.resolved(), 0);
}

#[test]
fn test_validation_is_idempotent() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = RuleRegistry::new();
    registry
        .register("cloud", "ok", counting_rule("ok", Outcome::Valid, calls.clone()))
        .unwrap();
    registry
        .register(
            "cloud",
            "fail",
            counting_rule("fail", Outcome::invalid("nope"), calls.clone()),
        )
        .unwrap();

    let scenario = ScenarioDescriptor::builder("Dummy.twice")
        .namespace("cloud")
        .validator("ok", RuleArgs::new())
        .validator("fail", RuleArgs::new())
        .build();
    let config = empty_config();
    let deployment = FakeDeployment::new();

    let runner = ValidationRunner::new(&registry, RunnerConfig::new());
    let first = runner.validate(&scenario, &config, &deployment, None).unwrap();
    let second = runner.validate(&scenario, &config, &deployment, None).unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

proptest! {
    #[test]
    fn prop_attachment_order_is_preserved(names in prop::collection::vec("[a-z]{1,8}", 0..16)) {
        let mut builder = ScenarioDescriptor::builder("Dummy.stacked");
        for (index, name) in names.iter().enumerate() {
            builder = builder.validator(name.clone(), RuleArgs::new().arg(index));
        }
        let scenario = builder.build();

        prop_assert_eq!(scenario.validators().len(), names.len());
        for (index, (entry, name)) in scenario.validators().iter().zip(&names).enumerate() {
            prop_assert_eq!(&entry.rule, name);
            prop_assert_eq!(entry.args.positional(), &[json!(index)][..]);
        }
    }

    #[test]
    fn prop_runner_stops_at_first_failure(verdicts in prop::collection::vec(any::<bool>(), 1..12)) {
        let counters: Vec<Arc<AtomicUsize>> =
            verdicts.iter().map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let mut registry = RuleRegistry::new();
        let mut builder = ScenarioDescriptor::builder("Dummy.mixed").namespace("cloud");
        let names: Vec<String> = (0..verdicts.len()).map(|i| format!("rule_{i}")).collect();

        for ((name, valid), calls) in names.iter().zip(&verdicts).zip(&counters) {
            let outcome = if *valid {
                Outcome::Valid
            } else {
                Outcome::invalid(format!("{name} failed"))
            };
            registry
                .register("cloud", name, counting_rule("generated", outcome, calls.clone()))
                .unwrap();
            builder = builder.validator(name.clone(), RuleArgs::new());
        }
        let scenario = builder.build();

        let runner = ValidationRunner::new(&registry, RunnerConfig::new());
        let outcome = runner
            .validate(&scenario, &empty_config(), &FakeDeployment::new(), None)
            .unwrap();

        match verdicts.iter().position(|valid| !valid) {
            Some(first_failure) => {
                let expected = format!("rule_{first_failure} failed");
                prop_assert_eq!(outcome.message(), Some(expected.as_str()));
                for (index, calls) in counters.iter().enumerate() {
                    let expected_calls = usize::from(index <= first_failure);
                    prop_assert_eq!(calls.load(Ordering::SeqCst), expected_calls);
                }
            }
            None => {
                prop_assert!(outcome.is_valid());
                for calls in &counters {
                    prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
                }
            }
        }
    }
}
