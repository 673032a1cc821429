//! Service collaborators used by scenario bodies
//!
//! The embedding framework implements these traits over its real clients;
//! scenario bodies only see the operations they exercise.

use preflight_core::{ClientResult, Image};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Image creation request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageSpec {
    /// Container format, e.g. `bare`
    pub container_format: String,
    /// Local path or URL of the image data
    pub image_location: String,
    /// Disk format, e.g. `qcow2`
    pub disk_format: String,
    /// `public` or `private`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    /// Minimum disk in GiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_disk: Option<u64>,
    /// Minimum RAM in MiB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_ram: Option<u64>,
    /// Remaining service-specific properties
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ImageSpec {
    /// Create request for an image at `image_location`
    pub fn new(
        container_format: impl Into<String>,
        image_location: impl Into<String>,
        disk_format: impl Into<String>,
    ) -> Self {
        Self {
            container_format: container_format.into(),
            image_location: image_location.into(),
            disk_format: disk_format.into(),
            ..Self::default()
        }
    }

    /// Set visibility
    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = Some(visibility.into());
        self
    }

    /// Set minimum disk and RAM
    #[must_use]
    pub fn with_minimums(mut self, min_disk: u64, min_ram: u64) -> Self {
        self.min_disk = Some(min_disk);
        self.min_ram = Some(min_ram);
        self
    }

    /// Merge extra properties
    #[must_use]
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties.extend(properties);
        self
    }
}

/// Image update request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageUpdate {
    /// New minimum disk in GiB
    pub min_disk: u64,
    /// New minimum RAM in MiB
    pub min_ram: u64,
    /// Property names to remove
    #[serde(default)]
    pub remove_props: Vec<String>,
}

/// Booted server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Service-assigned id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Server boot request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BootRequest {
    /// Image to boot from
    pub image_id: String,
    /// Flavor to boot with
    pub flavor_id: String,
    /// Number of servers
    pub count: u32,
    /// Extra boot parameters
    #[serde(default)]
    pub options: Map<String, Value>,
}

/// Image service operations
#[cfg_attr(test, mockall::automock)]
pub trait ImageService: Send + Sync {
    /// Create an image
    fn create_image(&self, spec: &ImageSpec) -> ClientResult<Image>;

    /// List images visible to the caller
    fn list_images(&self) -> ClientResult<Vec<Image>>;

    /// Fetch one image
    fn get_image(&self, id: &str) -> ClientResult<Image>;

    /// Delete one image
    fn delete_image(&self, id: &str) -> ClientResult<()>;

    /// Update one image
    fn update_image(&self, id: &str, update: &ImageUpdate) -> ClientResult<Image>;
}

/// Server operations
#[cfg_attr(test, mockall::automock)]
pub trait ServerService: Send + Sync {
    /// Boot `request.count` servers from one image
    fn boot_servers(&self, request: &BootRequest) -> ClientResult<Vec<Server>>;
}
