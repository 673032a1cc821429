//! Resource existence rules: flavors, images and volume types

use crate::error::ResourceError;
use crate::resource::{flavor_id, image_id, ResourceSpec};
use crate::value::{display, is_truthy, with_clients};
use preflight_core::{
    ClientHandleSet, Flavor, Image, Outcome, RuleArgs, RuleInput, RuleResult, ScenarioConfig,
};
use serde_json::{Map, Value};

const GIB: u64 = 1024 * 1024 * 1024;

/// Either the resolved resource or the outcome explaining why not
type Validated<T> = Result<T, Outcome>;

fn not_specified(param_name: &str) -> Outcome {
    Outcome::invalid(format!("Parameter {param_name} is not specified."))
}

/// Turn a resolution failure into a miss, or a hard error for real client failures
fn miss(error: ResourceError) -> RuleResult<()> {
    match error.into_client_error() {
        Some(client) => Err(client.into()),
        None => Ok(()),
    }
}

/// Flavor named by `param_name`, falling back to the `flavors` context
pub(crate) fn validated_flavor(
    config: &ScenarioConfig,
    clients: &dyn ClientHandleSet,
    param_name: &str,
) -> RuleResult<Validated<Flavor>> {
    let Some(spec) = config.arg(param_name).filter(|v| is_truthy(v)) else {
        return Ok(Err(not_specified(param_name)));
    };

    let compute = clients.compute()?;
    let looked_up = flavor_id(compute, spec)
        .and_then(|id| compute.flavor(&id).map_err(ResourceError::from));
    match looked_up {
        Ok(flavor) => return Ok(Ok(flavor)),
        Err(e) => miss(e)?,
    }

    if let Some(flavor) = context_flavor(config, spec) {
        tracing::debug!(flavor = %flavor.name, "flavor provided by flavors context");
        return Ok(Ok(flavor));
    }
    Ok(Err(Outcome::invalid(format!(
        "Flavor '{}' not found",
        display(spec)
    ))))
}

/// Flavor the `flavors` context will create, matched by name or regex
fn context_flavor(config: &ScenarioConfig, spec: &Value) -> Option<Flavor> {
    let declared: Vec<Flavor> = config
        .context_entry("flavors")?
        .as_array()?
        .iter()
        .filter_map(Value::as_object)
        .filter_map(flavor_from_context)
        .collect();
    let spec = ResourceSpec::parse("flavor", spec).ok()?;
    spec.find("flavor", &declared).ok().cloned()
}

fn flavor_from_context(entry: &Map<String, Value>) -> Option<Flavor> {
    let name = entry.get("name")?.as_str()?;
    let number = |key: &str, default: u64| entry.get(key).map_or(Some(default), Value::as_u64);
    Some(Flavor {
        id: format!("<context flavor: {name}>"),
        name: name.to_string(),
        ram: entry.get("ram")?.as_u64()?,
        vcpus: u32::try_from(number("vcpus", 1)?).ok()?,
        disk: number("disk", 0)?,
    })
}

/// Image named by `param_name`, or the one the `images` context uploads
pub(crate) fn validated_image(
    config: &ScenarioConfig,
    clients: &dyn ClientHandleSet,
    param_name: &str,
) -> RuleResult<Validated<Image>> {
    let Some(spec) = config.arg(param_name).filter(|v| is_truthy(v)) else {
        return Ok(Err(not_specified(param_name)));
    };

    if let Some(image) = context_image(config, spec) {
        return Ok(Ok(image));
    }

    let images = clients.image()?;
    let looked_up =
        image_id(images, spec).and_then(|id| images.image(&id).map_err(ResourceError::from));
    match looked_up {
        Ok(image) => Ok(Ok(image)),
        Err(e) => {
            miss(e)?;
            Ok(Err(Outcome::invalid(format!(
                "Image '{}' not found",
                display(spec)
            ))))
        }
    }
}

fn context_image(config: &ScenarioConfig, spec: &Value) -> Option<Image> {
    let context = config.context_entry("images")?.as_object()?;
    let name = context.get("image_name")?.as_str()?;
    let spec = ResourceSpec::parse("image", spec).ok()?;
    if !spec.matches("image", name).unwrap_or(false) {
        return None;
    }

    let number = |key: &str| context.get(key).and_then(Value::as_u64).unwrap_or(0);
    Some(Image {
        id: format!("<context image: {name}>"),
        name: name.to_string(),
        size: number("min_disk"),
        min_ram: number("min_ram"),
        min_disk: number("min_disk"),
    })
}

/// `flavor_exists(param_name)`
pub(crate) fn flavor_exists(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let config = input.config;
    let param_name = args.require_str("param_name", 0)?;
    with_clients(input, |clients| {
        Ok(validated_flavor(config, clients, param_name)?.map_or_else(|o| o, |_| Outcome::Valid))
    })
}

/// `image_exists(param_name, nullable = false)`
pub(crate) fn image_exists(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let config = input.config;
    let param_name = args.require_str("param_name", 0)?;
    let nullable = args.bool_or("nullable", 1, false)?;
    if nullable && !config.arg(param_name).is_some_and(is_truthy) {
        return Ok(Outcome::Valid);
    }

    with_clients(input, |clients| {
        Ok(validated_image(config, clients, param_name)?.map_or_else(|o| o, |_| Outcome::Valid))
    })
}

/// `image_valid_on_flavor(flavor_param, image_param, validate_disk = true, fail_on_404_image = true)`
pub(crate) fn image_valid_on_flavor(
    input: &RuleInput<'_>,
    args: &RuleArgs,
) -> RuleResult<Outcome> {
    let config = input.config;
    let flavor_param = args.require_str("flavor_param", 0)?;
    let image_param = args.require_str("image_param", 1)?;
    let validate_disk = args.bool_or("validate_disk", 2, true)?;
    let fail_on_missing_image = args.bool_or("fail_on_404_image", 3, true)?;

    with_clients(input, |clients| {
        let flavor = match validated_flavor(config, clients, flavor_param)? {
            Ok(flavor) => flavor,
            Err(outcome) => return Ok(outcome),
        };
        let image = match validated_image(config, clients, image_param)? {
            Ok(image) => image,
            Err(_) if !fail_on_missing_image => return Ok(Outcome::Valid),
            Err(outcome) => return Ok(outcome),
        };

        if flavor.ram < image.min_ram {
            return Ok(Outcome::invalid(format!(
                "The memory size for flavor '{}' is too small to boot image '{}'",
                flavor.id, image.id
            )));
        }
        if flavor.disk > 0 && validate_disk {
            if image.size > flavor.disk.saturating_mul(GIB) {
                return Ok(Outcome::invalid(format!(
                    "The disk size for flavor '{}' is too small for requested image '{}'",
                    flavor.id, image.id
                )));
            }
            if image.min_disk > flavor.disk {
                return Ok(Outcome::invalid(format!(
                    "The minimal disk size for flavor '{}' is too small for requested image '{}'",
                    flavor.id, image.id
                )));
            }
        }
        Ok(Outcome::Valid)
    })
}

/// `volume_type_exists(param_name)`
pub(crate) fn volume_type_exists(input: &RuleInput<'_>, args: &RuleArgs) -> RuleResult<Outcome> {
    let config = input.config;
    let param_name = args.require_str("param_name", 0)?;
    if !config.arg(param_name).is_some_and(is_truthy) {
        return Ok(Outcome::Valid);
    }

    with_clients(input, |clients| {
        let types = clients.block_storage()?.volume_types()?;
        Ok(Outcome::check(!types.is_empty(), || {
            "Must have at least one volume type created when specifying use of volume types."
                .to_string()
        }))
    })
}
