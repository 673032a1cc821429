//! Scenario argument conversions
//!
//! Applied after validation passes and before the scenario body runs. Only
//! arguments present in the invocation are converted.

use crate::error::{ScenarioError, ScenarioResult};
use preflight_core::{ArgKind, ComputeClient, ScenarioDescriptor};
use preflight_rules::{expand_home, resource, ResourceError};
use serde_json::{Map, Value};

/// Apply every conversion attached to `scenario` to `args` in place
///
/// `compute` is only needed for [`ArgKind::ComputeFlavor`].
///
/// # Errors
/// Returns [`ScenarioError::Conversion`] when an argument has the wrong
/// shape or cannot be resolved, and [`ScenarioError::Service`] when a
/// client call fails.
pub fn convert_args(
    scenario: &ScenarioDescriptor,
    args: &mut Map<String, Value>,
    compute: Option<&dyn ComputeClient>,
) -> ScenarioResult<()> {
    for conversion in scenario.conversions() {
        let Some(value) = args.get(&conversion.arg) else {
            continue;
        };
        let converted = match conversion.kind {
            ArgKind::PathOrUrl => {
                let location = value.as_str().ok_or_else(|| {
                    ScenarioError::conversion(&conversion.arg, "expected a path or URL string")
                })?;
                Value::String(path_or_url(location))
            }
            ArgKind::ImageArgs => image_args(&conversion.arg, value)?,
            ArgKind::ComputeFlavor => {
                let compute = compute.ok_or_else(|| {
                    ScenarioError::conversion(&conversion.arg, "no compute client available")
                })?;
                Value::String(flavor(&conversion.arg, compute, value)?)
            }
        };
        tracing::trace!(
            scenario = scenario.name(),
            arg = %conversion.arg,
            kind = ?conversion.kind,
            "converted argument"
        );
        args.insert(conversion.arg.clone(), converted);
    }
    Ok(())
}

/// Resolve a location to an absolute local path if it names an existing file
///
/// Anything else, URLs included, is returned unchanged.
#[must_use]
pub fn path_or_url(location: &str) -> String {
    let path = expand_home(location);
    if !path.is_file() {
        return location.to_string();
    }
    std::fs::canonicalize(&path)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}

/// Rewrite the deprecated `is_public` flag into `visibility`
///
/// An explicit `visibility` wins and the flag is dropped.
///
/// # Errors
/// Returns [`ScenarioError::Conversion`] if `value` is not a mapping
pub fn image_args(arg: &str, value: &Value) -> ScenarioResult<Value> {
    let Value::Object(map) = value else {
        return Err(ScenarioError::conversion(arg, "expected a mapping"));
    };
    let mut map = map.clone();
    if let Some(is_public) = map.remove("is_public") {
        tracing::warn!(
            arg,
            "image argument 'is_public' is deprecated; use 'visibility' instead"
        );
        if !map.contains_key("visibility") {
            let visibility = if is_public.as_bool().unwrap_or(false) {
                "public"
            } else {
                "private"
            };
            map.insert("visibility".to_string(), Value::from(visibility));
        }
    }
    Ok(Value::Object(map))
}

fn flavor(arg: &str, compute: &dyn ComputeClient, spec: &Value) -> ScenarioResult<String> {
    resource::flavor_id(compute, spec).map_err(|e| match e {
        ResourceError::Client(client) if !client.is_not_found() => ScenarioError::Service(client),
        other => ScenarioError::conversion(arg, other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use preflight_test_utils::FakeClients;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    fn scenario() -> ScenarioDescriptor {
        ScenarioDescriptor::builder("Images.boot")
            .convert("image_location", ArgKind::PathOrUrl)
            .convert("kwargs", ArgKind::ImageArgs)
            .convert("flavor", ArgKind::ComputeFlavor)
            .build()
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn urls_and_missing_paths_pass_through() {
        assert_eq!(
            path_or_url("http://example.com/cirros.img"),
            "http://example.com/cirros.img"
        );
        assert_eq!(path_or_url("/nonexistent/cirros.img"), "/nonexistent/cirros.img");
    }

    #[test]
    fn existing_files_become_absolute() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "image").unwrap();
        let canonical = std::fs::canonicalize(file.path()).unwrap();

        let converted = path_or_url(file.path().to_str().unwrap());
        assert_eq!(converted, canonical.to_string_lossy());
        assert!(std::path::Path::new(&converted).is_absolute());
    }

    #[test]
    fn is_public_rewritten() {
        assert_eq!(
            image_args("kwargs", &json!({"is_public": true, "min_ram": 1})).unwrap(),
            json!({"min_ram": 1, "visibility": "public"})
        );
        assert_eq!(
            image_args("kwargs", &json!({"is_public": false})).unwrap(),
            json!({"visibility": "private"})
        );
        assert_eq!(
            image_args("kwargs", &json!({"is_public": true, "visibility": "shared"})).unwrap(),
            json!({"visibility": "shared"})
        );
        assert!(matches!(
            image_args("kwargs", &json!("public")),
            Err(ScenarioError::Conversion { .. })
        ));
    }

    #[test]
    fn flavor_resolved_to_id() {
        let clients = FakeClients::new()
            .with_flavor("1", "m1.tiny", 512, 1)
            .with_flavor("2", "m1.small", 2048, 20);
        let mut args = args(json!({
            "flavor": {"name": "m1.small"},
            "kwargs": {"is_public": true},
            "image_location": "http://example.com/cirros.img",
        }));

        convert_args(&scenario(), &mut args, Some(&clients as &dyn ComputeClient)).unwrap();

        assert_eq!(args["flavor"], json!("2"));
        assert_eq!(args["kwargs"], json!({"visibility": "public"}));
        assert_eq!(args["image_location"], json!("http://example.com/cirros.img"));
    }

    #[test]
    fn unknown_flavor_is_a_conversion_error() {
        let clients = FakeClients::new().with_flavor("1", "m1.tiny", 512, 1);
        let mut args = args(json!({"flavor": {"name": "m1.huge"}}));

        let err = convert_args(&scenario(), &mut args, Some(&clients as &dyn ComputeClient))
            .unwrap_err();
        assert!(matches!(err, ScenarioError::Conversion { ref arg, .. } if arg == "flavor"));
    }

    #[test]
    fn flavor_needs_compute_client() {
        let mut args = args(json!({"flavor": "m1.tiny"}));
        assert!(convert_args(&scenario(), &mut args, None).is_err());
    }

    #[test]
    fn absent_arguments_untouched() {
        let mut args = args(json!({"container_format": "bare"}));
        convert_args(&scenario(), &mut args, None).unwrap();
        assert_eq!(args.len(), 1);
    }
}
