//! Image service scenarios
//!
//! Each scenario is a [`ScenarioDescriptor`] carrying its validators and
//! argument conversions, plus a body on [`GlanceImages`]. Bodies take the
//! invocation's arguments after conversion.

use crate::error::{ScenarioError, ScenarioResult};
use crate::services::{BootRequest, ImageService, ImageSpec, ImageUpdate, ServerService};
use preflight_core::{
    ArgKind, ClientError, Image, RuleArgs, ScenarioBuilder, ScenarioDescriptor, DEFAULT_PLATFORM,
};
use preflight_rules::CLOUD_NAMESPACE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Create an image, then list images
pub const CREATE_AND_LIST_IMAGE: &str = "GlanceImages.create_and_list_image";
/// Create an image, then fetch it
pub const CREATE_AND_GET_IMAGE: &str = "GlanceImages.create_and_get_image";
/// List images
pub const LIST_IMAGES: &str = "GlanceImages.list_images";
/// Create an image, then delete it
pub const CREATE_AND_DELETE_IMAGE: &str = "GlanceImages.create_and_delete_image";
/// Create an image, then boot servers from it
pub const CREATE_IMAGE_AND_BOOT_INSTANCES: &str = "GlanceImages.create_image_and_boot_instances";
/// Create an image, then update it
pub const CREATE_AND_UPDATE_IMAGE: &str = "GlanceImages.create_and_update_image";

fn scenario(name: &str, cleanup: &[&str]) -> ScenarioBuilder {
    ScenarioDescriptor::builder(name)
        .namespace(CLOUD_NAMESPACE)
        .context(json!({ "cleanup": cleanup }))
        .validator(
            "required_platform",
            RuleArgs::new()
                .kw("platform", DEFAULT_PLATFORM)
                .kw("users", true),
        )
}

fn image_conversions(builder: ScenarioBuilder) -> ScenarioBuilder {
    builder
        .convert("image_location", ArgKind::PathOrUrl)
        .convert("kwargs", ArgKind::ImageArgs)
}

fn restrict_names(builder: ScenarioBuilder) -> ScenarioBuilder {
    builder.validator(
        "restricted_parameters",
        RuleArgs::new().arg(json!(["image_name", "name"])),
    )
}

fn requires_image(builder: ScenarioBuilder) -> ScenarioBuilder {
    builder.validator("required_services", RuleArgs::new().arg("image"))
}

/// Descriptor for [`CREATE_AND_LIST_IMAGE`]
#[must_use]
pub fn create_and_list_image() -> ScenarioDescriptor {
    let builder = requires_image(scenario(CREATE_AND_LIST_IMAGE, &["glance"]));
    restrict_names(image_conversions(builder)).build()
}

/// Descriptor for [`CREATE_AND_GET_IMAGE`]
#[must_use]
pub fn create_and_get_image() -> ScenarioDescriptor {
    image_conversions(requires_image(scenario(CREATE_AND_GET_IMAGE, &["glance"]))).build()
}

/// Descriptor for [`LIST_IMAGES`]
#[must_use]
pub fn list_images() -> ScenarioDescriptor {
    requires_image(scenario(LIST_IMAGES, &["glance"])).build()
}

/// Descriptor for [`CREATE_AND_DELETE_IMAGE`]
#[must_use]
pub fn create_and_delete_image() -> ScenarioDescriptor {
    let builder = requires_image(scenario(CREATE_AND_DELETE_IMAGE, &["glance"]));
    restrict_names(image_conversions(builder)).build()
}

/// Descriptor for [`CREATE_IMAGE_AND_BOOT_INSTANCES`]
#[must_use]
pub fn create_image_and_boot_instances() -> ScenarioDescriptor {
    let builder = scenario(CREATE_IMAGE_AND_BOOT_INSTANCES, &["glance", "nova"])
        .validator(
            "required_services",
            RuleArgs::new().arg("image").arg("compute"),
        )
        .validator("flavor_exists", RuleArgs::new().arg("flavor"))
        .convert("flavor", ArgKind::ComputeFlavor);
    restrict_names(image_conversions(builder)).build()
}

/// Descriptor for [`CREATE_AND_UPDATE_IMAGE`]
#[must_use]
pub fn create_and_update_image() -> ScenarioDescriptor {
    image_conversions(requires_image(scenario(CREATE_AND_UPDATE_IMAGE, &["glance"]))).build()
}

/// Every image scenario descriptor
#[must_use]
pub fn descriptors() -> Vec<ScenarioDescriptor> {
    vec![
        create_and_list_image(),
        create_and_get_image(),
        list_images(),
        create_and_delete_image(),
        create_image_and_boot_instances(),
        create_and_update_image(),
    ]
}

/// Arguments of the create scenarios that forward extra image properties
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImageArgs {
    /// Container format, e.g. `bare`
    pub container_format: String,
    /// Local path or URL of the image data
    pub image_location: String,
    /// Disk format, e.g. `qcow2`
    pub disk_format: String,
    /// Extra image creation properties
    #[serde(flatten)]
    pub kwargs: Map<String, Value>,
}

/// Arguments of [`CREATE_AND_GET_IMAGE`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAndGetArgs {
    /// Container format, e.g. `bare`
    pub container_format: String,
    /// Local path or URL of the image data
    pub image_location: String,
    /// Disk format, e.g. `qcow2`
    pub disk_format: String,
    /// `public` or `private`
    #[serde(default = "private")]
    pub visibility: String,
    /// Minimum disk in GiB
    #[serde(default)]
    pub min_disk: u64,
    /// Minimum RAM in MiB
    #[serde(default)]
    pub min_ram: u64,
}

/// Arguments of [`CREATE_IMAGE_AND_BOOT_INSTANCES`]
#[derive(Debug, Clone, Deserialize)]
pub struct BootInstancesArgs {
    /// Container format, e.g. `bare`
    pub container_format: String,
    /// Local path or URL of the image data
    pub image_location: String,
    /// Disk format, e.g. `qcow2`
    pub disk_format: String,
    /// Flavor id, resolved by argument conversion
    pub flavor: String,
    /// Servers to boot
    pub number_instances: u32,
    /// Extra image creation properties
    #[serde(default)]
    pub create_image_kwargs: Option<Map<String, Value>>,
    /// Extra boot parameters
    #[serde(default)]
    pub boot_server_kwargs: Option<Map<String, Value>>,
    /// Boot parameters in the deprecated position
    #[serde(flatten)]
    pub kwargs: Map<String, Value>,
}

/// Arguments of [`CREATE_AND_UPDATE_IMAGE`]
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAndUpdateArgs {
    /// Container format, e.g. `bare`
    pub container_format: String,
    /// Local path or URL of the image data
    pub image_location: String,
    /// Disk format, e.g. `qcow2`
    pub disk_format: String,
    /// Property names removed by the update
    #[serde(default)]
    pub remove_props: Option<Vec<String>>,
    /// `public` or `private`
    #[serde(default = "private")]
    pub visibility: String,
    /// Minimum disk in GiB at creation
    #[serde(default)]
    pub create_min_disk: u64,
    /// Minimum RAM in MiB at creation
    #[serde(default)]
    pub create_min_ram: u64,
    /// Minimum disk in GiB after the update
    #[serde(default)]
    pub update_min_disk: u64,
    /// Minimum RAM in MiB after the update
    #[serde(default)]
    pub update_min_ram: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

fn private() -> String {
    "private".to_string()
}

/// Spread a nested `kwargs` mapping into its parent
fn spread_kwargs(mut kwargs: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(nested)) = kwargs.remove("kwargs") {
        kwargs.extend(nested);
    }
    kwargs
}

fn image_spec(
    container_format: String,
    image_location: String,
    disk_format: String,
    properties: Map<String, Value>,
) -> ScenarioResult<ImageSpec> {
    let mut fields = properties;
    fields.insert("container_format".to_string(), container_format.into());
    fields.insert("image_location".to_string(), image_location.into());
    fields.insert("disk_format".to_string(), disk_format.into());
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn parse<T: DeserializeOwned>(args: &Map<String, Value>) -> ScenarioResult<T> {
    Ok(serde_json::from_value(Value::Object(args.clone()))?)
}

/// Scenario bodies over the image and server services
#[derive(Clone, Copy)]
pub struct GlanceImages<'a> {
    images: &'a dyn ImageService,
    servers: Option<&'a dyn ServerService>,
}

impl<'a> GlanceImages<'a> {
    /// Create bodies over an image service
    #[must_use]
    pub fn new(images: &'a dyn ImageService) -> Self {
        Self {
            images,
            servers: None,
        }
    }

    /// Attach the server service used by the boot scenario
    #[must_use]
    pub fn with_servers(mut self, servers: &'a dyn ServerService) -> Self {
        self.servers = Some(servers);
        self
    }

    /// Run scenario `name` with converted arguments
    ///
    /// # Errors
    /// - [`ScenarioError::Unknown`] if `name` is not an image scenario
    /// - [`ScenarioError::Arguments`] if `args` do not fit the scenario
    /// - any error from the scenario body
    pub fn run(&self, name: &str, args: &Map<String, Value>) -> ScenarioResult<()> {
        tracing::debug!(scenario = name, "running scenario");
        match name {
            CREATE_AND_LIST_IMAGE => self.create_and_list_image(parse(args)?),
            CREATE_AND_GET_IMAGE => self.create_and_get_image(parse(args)?),
            LIST_IMAGES => {
                parse::<NoArgs>(args)?;
                self.list_images()
            }
            CREATE_AND_DELETE_IMAGE => self.create_and_delete_image(parse(args)?),
            CREATE_IMAGE_AND_BOOT_INSTANCES => {
                self.create_image_and_boot_instances(parse(args)?)
            }
            CREATE_AND_UPDATE_IMAGE => self.create_and_update_image(parse(args)?),
            other => Err(ScenarioError::Unknown(other.to_string())),
        }
    }

    fn create(&self, spec: &ImageSpec) -> ScenarioResult<Image> {
        let image = self.images.create_image(spec)?;
        if image.id.is_empty() {
            return Err(ScenarioError::Assertion(
                "image service returned no image".to_string(),
            ));
        }
        tracing::debug!(image = %image.id, "created image");
        Ok(image)
    }

    /// Create an image and check it shows up in the image list
    ///
    /// # Errors
    /// Returns [`ScenarioError::Assertion`] if the new image is not listed
    pub fn create_and_list_image(&self, args: CreateImageArgs) -> ScenarioResult<()> {
        let spec = image_spec(
            args.container_format,
            args.image_location,
            args.disk_format,
            spread_kwargs(args.kwargs),
        )?;
        let image = self.create(&spec)?;
        let listed = self.images.list_images()?;
        if !listed.iter().any(|i| i.id == image.id) {
            return Err(ScenarioError::Assertion(format!(
                "image '{}' not found in image list",
                image.id
            )));
        }
        Ok(())
    }

    /// Create an image and fetch it back by id
    ///
    /// # Errors
    /// Returns [`ScenarioError::Assertion`] if the fetched id differs
    pub fn create_and_get_image(&self, args: CreateAndGetArgs) -> ScenarioResult<()> {
        let spec = ImageSpec::new(args.container_format, args.image_location, args.disk_format)
            .with_visibility(args.visibility)
            .with_minimums(args.min_disk, args.min_ram);
        let image = self.create(&spec)?;
        let fetched = self.images.get_image(&image.id)?;
        if fetched.id != image.id {
            return Err(ScenarioError::Assertion(format!(
                "expected image '{}', got '{}'",
                image.id, fetched.id
            )));
        }
        Ok(())
    }

    /// List images
    ///
    /// # Errors
    /// Returns [`ScenarioError::Service`] if listing fails
    pub fn list_images(&self) -> ScenarioResult<()> {
        let images = self.images.list_images()?;
        tracing::debug!(count = images.len(), "listed images");
        Ok(())
    }

    /// Create an image, then delete it
    ///
    /// # Errors
    /// Returns [`ScenarioError::Service`] if either call fails
    pub fn create_and_delete_image(&self, args: CreateImageArgs) -> ScenarioResult<()> {
        let spec = image_spec(
            args.container_format,
            args.image_location,
            args.disk_format,
            spread_kwargs(args.kwargs),
        )?;
        let image = self.create(&spec)?;
        self.images.delete_image(&image.id)?;
        Ok(())
    }

    /// Create an image and boot `number_instances` servers from it
    ///
    /// Boot parameters left in the deprecated `kwargs` position are used only
    /// when `boot_server_kwargs` is empty.
    ///
    /// # Errors
    /// Returns [`ScenarioError::Service`] if no server service is attached
    /// or a call fails
    pub fn create_image_and_boot_instances(&self, args: BootInstancesArgs) -> ScenarioResult<()> {
        let servers = self
            .servers
            .ok_or_else(|| ClientError::Unsupported("servers".to_string()))?;

        let deprecated = spread_kwargs(args.kwargs);
        if !deprecated.is_empty() {
            tracing::warn!(
                scenario = CREATE_IMAGE_AND_BOOT_INSTANCES,
                since = "0.8.0",
                "'kwargs' is deprecated: use 'boot_server_kwargs' for additional parameters when booting servers"
            );
        }
        let options = match args.boot_server_kwargs {
            Some(options) if !options.is_empty() => options,
            _ => deprecated,
        };

        let spec = image_spec(
            args.container_format,
            args.image_location,
            args.disk_format,
            args.create_image_kwargs.unwrap_or_default(),
        )?;
        let image = self.create(&spec)?;
        let booted = servers.boot_servers(&BootRequest {
            image_id: image.id,
            flavor_id: args.flavor,
            count: args.number_instances,
            options,
        })?;
        tracing::debug!(servers = booted.len(), "booted servers");
        Ok(())
    }

    /// Create an image, then update its minimums and drop properties
    ///
    /// # Errors
    /// Returns [`ScenarioError::Service`] if either call fails
    pub fn create_and_update_image(&self, args: CreateAndUpdateArgs) -> ScenarioResult<()> {
        let spec = ImageSpec::new(args.container_format, args.image_location, args.disk_format)
            .with_visibility(args.visibility)
            .with_minimums(args.create_min_disk, args.create_min_ram);
        let image = self.create(&spec)?;
        self.images.update_image(
            &image.id,
            &ImageUpdate {
                min_disk: args.update_min_disk,
                min_ram: args.update_min_ram,
                remove_props: args.remove_props.unwrap_or_default(),
            },
        )?;
        Ok(())
    }
}

impl std::fmt::Debug for GlanceImages<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlanceImages")
            .field("servers", &self.servers.is_some())
            .finish_non_exhaustive()
    }
}
