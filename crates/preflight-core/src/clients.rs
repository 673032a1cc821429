//! Collaborator interfaces
//!
//! The core never talks to a live system itself. Rules reach it through
//! these capability traits, which the embedding framework implements:
//!
//! ```text
//! Deployment ──credentials_for(platform)──▶ PlatformCredentials
//!                                             │ admin / users
//!                                             ▼
//!                                         Credential ──clients()──▶ ClientHandleSet
//!                                                                    ├─ services()
//!                                                                    ├─ compute() / image() / ...
//!                                                                    └─ choose_version()
//! ```

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Deployment descriptor for one invocation
pub trait Deployment: Send + Sync {
    /// Credentials registered for a platform (empty when unknown)
    fn credentials_for(&self, platform: &str) -> PlatformCredentials;
}

/// A credential that can produce a client handle set
#[cfg_attr(test, mockall::automock)]
pub trait Credential: Send + Sync {
    /// Derive the client handle set for this credential
    fn clients(&self) -> Arc<dyn ClientHandleSet>;
}

/// Admin and user credentials of one platform
#[derive(Clone, Default)]
pub struct PlatformCredentials {
    /// Admin credential, if the deployment has one
    pub admin: Option<Arc<dyn Credential>>,
    /// User credentials in declaration order
    pub users: Vec<Arc<dyn Credential>>,
}

impl PlatformCredentials {
    /// Create empty credential set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With admin credential
    #[inline]
    #[must_use]
    pub fn with_admin(mut self, admin: Arc<dyn Credential>) -> Self {
        self.admin = Some(admin);
        self
    }

    /// With an additional user credential
    #[inline]
    #[must_use]
    pub fn with_user(mut self, user: Arc<dyn Credential>) -> Self {
        self.users.push(user);
        self
    }

    /// Check if neither admin nor users are present
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admin.is_none() && self.users.is_empty()
    }
}

impl fmt::Debug for PlatformCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformCredentials")
            .field("admin", &self.admin.is_some())
            .field("users", &self.users.len())
            .finish()
    }
}

/// Bundle of service clients for one credential
///
/// Accessors default to [`ClientError::Unsupported`] so implementations only
/// provide the services they have.
pub trait ClientHandleSet: Send + Sync {
    /// Available services: service type -> service name
    fn services(&self) -> ClientResult<BTreeMap<String, String>>;

    /// Compute service client
    fn compute(&self) -> ClientResult<&dyn ComputeClient> {
        Err(ClientError::Unsupported("compute".to_string()))
    }

    /// Image service client
    fn image(&self) -> ClientResult<&dyn ImageClient> {
        Err(ClientError::Unsupported("image".to_string()))
    }

    /// Block storage service client
    fn block_storage(&self) -> ClientResult<&dyn BlockStorageClient> {
        Err(ClientError::Unsupported("block-storage".to_string()))
    }

    /// Orchestration service client
    fn orchestration(&self) -> ClientResult<&dyn OrchestrationClient> {
        Err(ClientError::Unsupported("orchestration".to_string()))
    }

    /// Identity service client
    fn identity(&self) -> ClientResult<&dyn IdentityClient> {
        Err(ClientError::Unsupported("identity".to_string()))
    }

    /// Network service client
    fn network(&self) -> ClientResult<&dyn NetworkClient> {
        Err(ClientError::Unsupported("network".to_string()))
    }

    /// API version the client for `component` would negotiate
    fn choose_version(&self, component: &str) -> ClientResult<Option<String>> {
        Err(ClientError::Unsupported(component.to_string()))
    }
}

/// Compute service lookups
pub trait ComputeClient: Send + Sync {
    /// Get flavor by id
    fn flavor(&self, id: &str) -> ClientResult<Flavor>;

    /// List all flavors
    fn flavors(&self) -> ClientResult<Vec<Flavor>>;

    /// List compute service processes
    fn services(&self) -> ClientResult<Vec<ServiceStatus>>;
}

/// Image service lookups
pub trait ImageClient: Send + Sync {
    /// Get image by id
    fn image(&self, id: &str) -> ClientResult<Image>;

    /// List all images
    fn images(&self) -> ClientResult<Vec<Image>>;
}

/// Block storage service lookups
pub trait BlockStorageClient: Send + Sync {
    /// List volume types
    fn volume_types(&self) -> ClientResult<Vec<VolumeType>>;

    /// List block storage service processes
    fn services(&self) -> ClientResult<Vec<ServiceStatus>>;
}

/// Orchestration service operations
pub trait OrchestrationClient: Send + Sync {
    /// Validate a stack template; `Err` carries the service's complaint
    fn validate_template(&self, template: &str) -> ClientResult<()>;
}

/// Identity service capabilities
pub trait IdentityClient: Send + Sync {
    /// Client speaks the tenant-based API
    fn exposes_tenants(&self) -> bool;

    /// Client speaks the project-based API
    fn exposes_projects(&self) -> bool;
}

/// Network service lookups
pub trait NetworkClient: Send + Sync {
    /// List networks visible to the caller
    fn networks(&self) -> ClientResult<Vec<Network>>;

    /// Aliases of the enabled API extensions
    fn extensions(&self) -> ClientResult<Vec<String>>;
}

/// Compute flavor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    /// Service-assigned id
    pub id: String,
    /// Display name
    pub name: String,
    /// RAM in MiB
    pub ram: u64,
    /// Virtual CPU count
    pub vcpus: u32,
    /// Root disk in GiB
    pub disk: u64,
}

/// Image record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Image {
    /// Service-assigned id
    pub id: String,
    /// Display name
    pub name: String,
    /// Size in bytes
    #[serde(default)]
    pub size: u64,
    /// Minimum RAM in MiB
    #[serde(default)]
    pub min_ram: u64,
    /// Minimum disk in GiB
    #[serde(default)]
    pub min_disk: u64,
}

/// Block storage volume type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeType {
    /// Service-assigned id
    pub id: String,
    /// Display name
    pub name: String,
}

/// Network record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    /// Service-assigned id
    pub id: String,
    /// Display name
    pub name: String,
    /// Routable from outside the cloud (floating IP pool)
    #[serde(default, rename = "router:external")]
    pub external: bool,
}

/// A service process as reported by a service list call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Process binary, e.g. `nova-network`
    pub binary: String,
    /// Administrative status, e.g. `enabled`
    pub status: String,
    /// Liveness state, e.g. `up`
    pub state: String,
}

impl ServiceStatus {
    /// Create service status record
    pub fn new(
        binary: impl Into<String>,
        status: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            status: status.into(),
            state: state.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoServices;

    impl ClientHandleSet for NoServices {
        fn services(&self) -> ClientResult<BTreeMap<String, String>> {
            Ok(BTreeMap::new())
        }
    }

    #[test]
    fn accessors_default_to_unsupported() {
        let clients = NoServices;
        assert!(matches!(clients.compute(), Err(ClientError::Unsupported(_))));
        assert!(matches!(clients.image(), Err(ClientError::Unsupported(_))));
        assert!(matches!(clients.network(), Err(ClientError::Unsupported(_))));
        assert_eq!(
            clients.choose_version("image").unwrap_err(),
            ClientError::Unsupported("image".to_string())
        );
    }

    #[test]
    fn platform_credentials_builder() {
        let creds = PlatformCredentials::new();
        assert!(creds.is_empty());

        let user: Arc<dyn Credential> = Arc::new(MockCredential::new());
        let creds = creds.with_user(user);
        assert!(!creds.is_empty());
        assert_eq!(creds.users.len(), 1);
        assert_eq!(format!("{creds:?}"), "PlatformCredentials { admin: false, users: 1 }");
    }
}
