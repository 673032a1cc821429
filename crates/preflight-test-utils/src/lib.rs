//! Testing utilities for preflight workspace
//!
//! In-memory fakes for every collaborator, plus config fixtures.

#![allow(missing_docs)]

use preflight_core::{
    BlockStorageClient, ClientError, ClientHandleSet, ClientResult, ComputeClient, Credential,
    Deployment, Flavor, IdentityClient, Image, ImageClient, Network, NetworkClient,
    OrchestrationClient, PlatformCredentials, ScenarioConfig, ServiceStatus, VolumeType,
    DEFAULT_PLATFORM,
};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

/// Install a test-writer tracing subscriber once per process
pub fn init_test_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Build a scenario config, panicking on malformed fixtures
pub fn scenario_config(value: Value) -> ScenarioConfig {
    ScenarioConfig::new(value).expect("fixture config must be a mapping")
}

/// Fake client handle set backed by plain collections
#[derive(Debug, Clone, Default)]
pub struct FakeClients {
    /// Service type -> service name
    pub services: BTreeMap<String, String>,
    pub flavors: Vec<Flavor>,
    pub images: Vec<Image>,
    pub volume_types: Vec<VolumeType>,
    pub networks: Vec<Network>,
    /// Enabled network extension aliases
    pub extensions: Vec<String>,
    pub compute_services: Vec<ServiceStatus>,
    pub storage_services: Vec<ServiceStatus>,
    /// Complaint returned by template validation, if any
    pub template_error: Option<String>,
    pub tenants: bool,
    pub projects: bool,
    /// Component -> negotiated API version
    pub versions: HashMap<String, String>,
    /// Accessors that report [`ClientError::Unsupported`]
    pub unsupported: BTreeSet<String>,
}

impl FakeClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an available service (type and name are the same string)
    pub fn with_service(mut self, service: &str) -> Self {
        self.services.insert(service.to_string(), service.to_string());
        self
    }

    pub fn with_flavor(mut self, id: &str, name: &str, ram: u64, disk: u64) -> Self {
        self.flavors.push(Flavor {
            id: id.to_string(),
            name: name.to_string(),
            ram,
            vcpus: 1,
            disk,
        });
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_volume_type(mut self, id: &str, name: &str) -> Self {
        self.volume_types.push(VolumeType {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn with_network(mut self, id: &str, name: &str, external: bool) -> Self {
        self.networks.push(Network {
            id: id.to_string(),
            name: name.to_string(),
            external,
        });
        self
    }

    pub fn with_extension(mut self, alias: &str) -> Self {
        self.extensions.push(alias.to_string());
        self
    }

    /// Make the named accessor (`compute`, `image`, `network`, ...) unavailable
    pub fn without_client(mut self, client: &str) -> Self {
        self.unsupported.insert(client.to_string());
        self
    }

    fn available(&self, client: &str) -> ClientResult<()> {
        if self.unsupported.contains(client) {
            Err(ClientError::Unsupported(client.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn with_compute_service(mut self, binary: &str, status: &str) -> Self {
        self.compute_services
            .push(ServiceStatus::new(binary, status, "up"));
        self
    }

    pub fn with_storage_service(mut self, binary: &str, state: &str) -> Self {
        self.storage_services
            .push(ServiceStatus::new(binary, "enabled", state));
        self
    }

    pub fn rejecting_templates(mut self, message: &str) -> Self {
        self.template_error = Some(message.to_string());
        self
    }

    pub fn with_identity(mut self, tenants: bool, projects: bool) -> Self {
        self.tenants = tenants;
        self.projects = projects;
        self
    }

    pub fn with_version(mut self, component: &str, version: &str) -> Self {
        self.versions
            .insert(component.to_string(), version.to_string());
        self
    }
}

impl ClientHandleSet for FakeClients {
    fn services(&self) -> ClientResult<BTreeMap<String, String>> {
        Ok(self.services.clone())
    }

    fn compute(&self) -> ClientResult<&dyn ComputeClient> {
        self.available("compute")?;
        Ok(self)
    }

    fn image(&self) -> ClientResult<&dyn ImageClient> {
        self.available("image")?;
        Ok(self)
    }

    fn block_storage(&self) -> ClientResult<&dyn BlockStorageClient> {
        self.available("block-storage")?;
        Ok(self)
    }

    fn orchestration(&self) -> ClientResult<&dyn OrchestrationClient> {
        self.available("orchestration")?;
        Ok(self)
    }

    fn identity(&self) -> ClientResult<&dyn IdentityClient> {
        self.available("identity")?;
        Ok(self)
    }

    fn network(&self) -> ClientResult<&dyn NetworkClient> {
        self.available("network")?;
        Ok(self)
    }

    fn choose_version(&self, component: &str) -> ClientResult<Option<String>> {
        Ok(self.versions.get(component).cloned())
    }
}

impl ComputeClient for FakeClients {
    fn flavor(&self, id: &str) -> ClientResult<Flavor> {
        self.flavors
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("flavor", id))
    }

    fn flavors(&self) -> ClientResult<Vec<Flavor>> {
        Ok(self.flavors.clone())
    }

    fn services(&self) -> ClientResult<Vec<ServiceStatus>> {
        Ok(self.compute_services.clone())
    }
}

impl ImageClient for FakeClients {
    fn image(&self, id: &str) -> ClientResult<Image> {
        self.images
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("image", id))
    }

    fn images(&self) -> ClientResult<Vec<Image>> {
        Ok(self.images.clone())
    }
}

impl BlockStorageClient for FakeClients {
    fn volume_types(&self) -> ClientResult<Vec<VolumeType>> {
        Ok(self.volume_types.clone())
    }

    fn services(&self) -> ClientResult<Vec<ServiceStatus>> {
        Ok(self.storage_services.clone())
    }
}

impl NetworkClient for FakeClients {
    fn networks(&self) -> ClientResult<Vec<Network>> {
        Ok(self.networks.clone())
    }

    fn extensions(&self) -> ClientResult<Vec<String>> {
        Ok(self.extensions.clone())
    }
}

impl OrchestrationClient for FakeClients {
    fn validate_template(&self, _template: &str) -> ClientResult<()> {
        match &self.template_error {
            Some(message) => Err(ClientError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

impl IdentityClient for FakeClients {
    fn exposes_tenants(&self) -> bool {
        self.tenants
    }

    fn exposes_projects(&self) -> bool {
        self.projects
    }
}

/// Credential that hands out a fixed handle set and counts resolutions
#[derive(Debug, Default)]
pub struct FakeCredential {
    clients: Arc<FakeClients>,
    resolved: AtomicUsize,
}

impl FakeCredential {
    pub fn new(clients: FakeClients) -> Self {
        Self {
            clients: Arc::new(clients),
            resolved: AtomicUsize::new(0),
        }
    }

    /// Number of `clients()` calls so far
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }
}

impl Credential for FakeCredential {
    fn clients(&self) -> Arc<dyn ClientHandleSet> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        self.clients.clone()
    }
}

/// Deployment holding credentials per platform
#[derive(Debug, Clone, Default)]
pub struct FakeDeployment {
    platforms: HashMap<String, PlatformCredentials>,
}

impl FakeDeployment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deployment with one user on the default platform
    pub fn with_single_user(clients: FakeClients) -> Self {
        Self::new().with_user(DEFAULT_PLATFORM, Arc::new(FakeCredential::new(clients)))
    }

    pub fn with_admin(mut self, platform: &str, admin: Arc<FakeCredential>) -> Self {
        let admin: Arc<dyn Credential> = admin;
        self.platforms
            .entry(platform.to_string())
            .or_default()
            .admin = Some(admin);
        self
    }

    pub fn with_user(mut self, platform: &str, user: Arc<FakeCredential>) -> Self {
        self.platforms
            .entry(platform.to_string())
            .or_default()
            .users
            .push(user);
        self
    }
}

impl Deployment for FakeDeployment {
    fn credentials_for(&self, platform: &str) -> PlatformCredentials {
        self.platforms.get(platform).cloned().unwrap_or_default()
    }
}
