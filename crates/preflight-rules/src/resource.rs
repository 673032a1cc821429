//! Resource-spec resolution
//!
//! Scenario arguments name cloud resources in one of three ways:
//!
//! | Spec | Resolution |
//! |---|---|
//! | `{"id": "..."}` | taken verbatim, no listing |
//! | `{"name": "..."}` or a bare string | exactly one resource with that name |
//! | `{"regex": "..."}` | exactly one name matching the pattern at its start |

use crate::error::ResourceError;
use preflight_core::{ClientResult, ComputeClient, Flavor, Image, ImageClient, VolumeType};
use regex::Regex;
use serde_json::Value;
use std::fmt;

/// A named, identified resource
pub trait Resource {
    /// Resource id
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;
}

impl Resource for Flavor {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for Image {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Resource for VolumeType {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Parsed resource spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceSpec {
    /// Exact id
    Id(String),
    /// Exact name
    Name(String),
    /// Name pattern, anchored at the start
    Regex(String),
}

impl ResourceSpec {
    /// Parse a spec from a scenario argument
    ///
    /// # Errors
    /// Returns [`ResourceError::InvalidSpec`] for anything but a string or a
    /// mapping with a string `id`, `name` or `regex`
    pub fn parse(kind: &str, value: &Value) -> Result<Self, ResourceError> {
        match value {
            Value::String(name) => Ok(Self::Name(name.clone())),
            Value::Object(map) => {
                for (key, build) in [
                    ("id", Self::Id as fn(String) -> Self),
                    ("name", Self::Name),
                    ("regex", Self::Regex),
                ] {
                    if let Some(field) = map.get(key) {
                        return field.as_str().map(|s| build(s.to_string())).ok_or_else(|| {
                            ResourceError::invalid_spec(kind, format!("'{key}' must be a string"))
                        });
                    }
                }
                Err(ResourceError::invalid_spec(
                    kind,
                    "expected one of 'id', 'name' or 'regex'",
                ))
            }
            other => Err(ResourceError::invalid_spec(
                kind,
                format!("unsupported spec {other}"),
            )),
        }
    }

    /// Check a bare name against this spec
    ///
    /// # Errors
    /// Returns [`ResourceError::InvalidSpec`] if the regex does not compile
    pub fn matches(&self, kind: &str, name: &str) -> Result<bool, ResourceError> {
        match self {
            Self::Id(_) => Ok(false),
            Self::Name(expected) => Ok(expected == name),
            Self::Regex(pattern) => Ok(anchored(kind, pattern)?.is_match(name)),
        }
    }

    /// Find the single resource this spec selects
    ///
    /// # Errors
    /// - [`ResourceError::NotFound`] if nothing matches
    /// - [`ResourceError::Ambiguous`] if a name or regex matches several
    pub fn find<'a, R: Resource>(
        &self,
        kind: &str,
        resources: &'a [R],
    ) -> Result<&'a R, ResourceError> {
        let matching: Vec<&R> = match self {
            Self::Id(id) => resources.iter().filter(|r| r.id() == id).collect(),
            Self::Name(name) => resources.iter().filter(|r| r.name() == name).collect(),
            Self::Regex(pattern) => {
                let re = anchored(kind, pattern)?;
                resources.iter().filter(|r| re.is_match(r.name())).collect()
            }
        };

        match matching.as_slice() {
            [single] => Ok(*single),
            [] => Err(ResourceError::not_found(kind, self.to_string())),
            many => Err(ResourceError::Ambiguous {
                kind: kind.to_string(),
                spec: self.to_string(),
                count: many.len(),
            }),
        }
    }

    /// Resolve to an id, listing candidates only when needed
    ///
    /// # Errors
    /// Same as [`find`](Self::find), plus client failures from `list`
    pub fn resolve_id<R, L>(&self, kind: &str, list: L) -> Result<String, ResourceError>
    where
        R: Resource,
        L: FnOnce() -> ClientResult<Vec<R>>,
    {
        if let Self::Id(id) = self {
            return Ok(id.clone());
        }
        let resources = list()?;
        self.find(kind, &resources).map(|r| r.id().to_string())
    }
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id={id}"),
            Self::Name(name) => write!(f, "name={name}"),
            Self::Regex(pattern) => write!(f, "regex={pattern}"),
        }
    }
}

fn anchored(kind: &str, pattern: &str) -> Result<Regex, ResourceError> {
    Regex::new(&format!("^(?:{pattern})"))
        .map_err(|e| ResourceError::invalid_spec(kind, format!("bad regex '{pattern}': {e}")))
}

/// Resolve a flavor spec to a flavor id
///
/// # Errors
/// See [`ResourceSpec::resolve_id`]
pub fn flavor_id(compute: &dyn ComputeClient, spec: &Value) -> Result<String, ResourceError> {
    ResourceSpec::parse("flavor", spec)?.resolve_id("flavor", || compute.flavors())
}

/// Resolve an image spec to an image id
///
/// # Errors
/// See [`ResourceSpec::resolve_id`]
pub fn image_id(image: &dyn ImageClient, spec: &Value) -> Result<String, ResourceError> {
    ResourceSpec::parse("image", spec)?.resolve_id("image", || image.images())
}
