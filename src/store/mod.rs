//! Cluster Store - the seam between bootstrap logic and the backing object store
//!
//! The bootstrap pipeline treats Kubernetes as an opaque object store keyed
//! by name and namespace. The [`ClusterStore`] trait captures exactly the
//! operations the pipeline needs; adapters implement it against the real API
//! server ([`KubeStore`]) or in process for tests ([`MemoryStore`]).

pub mod kube;
pub mod memory;

pub use self::kube::KubeStore;
pub use self::memory::MemoryStore;

use crate::crd::StorageClusterStatus;
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

// =============================================================================
// Object Key
// =============================================================================

/// Identity of one stored object: name plus namespace for namespaced kinds,
/// name alone for cluster-scoped kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub name: String,
    pub namespace: Option<String>,
}

impl ObjectKey {
    /// Key for a namespaced object
    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    /// Key for a cluster-scoped object
    pub fn cluster_scoped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Derive the key from object metadata; a missing name is an error
    pub fn from_meta(meta: &ObjectMeta) -> Result<Self> {
        let name = meta
            .name
            .clone()
            .ok_or_else(|| Error::MissingMetadata("name".into()))?;
        Ok(Self {
            name,
            namespace: meta.namespace.clone(),
        })
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}/{}", namespace, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// =============================================================================
// Cluster Store Trait
// =============================================================================

/// Typed object-store operations used by the bootstrap pipeline.
///
/// All `get_*` methods distinguish absence (`Ok(None)`) from failure (`Err`);
/// a permissions or transient backend error must never be reported as absent.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    async fn get_config_map(&self, key: &ObjectKey) -> Result<Option<ConfigMap>>;

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<()>;

    /// Replace an existing config map. Only used for the shared operator
    /// config; bootstrap-created objects are never updated after creation.
    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<()>;

    async fn get_secret(&self, key: &ObjectKey) -> Result<Option<Secret>>;

    async fn create_secret(&self, secret: &Secret) -> Result<()>;

    async fn get_storage_class(&self, key: &ObjectKey) -> Result<Option<StorageClass>>;

    async fn create_storage_class(&self, storage_class: &StorageClass) -> Result<()>;

    /// Persist the status subresource of a StorageCluster
    async fn patch_cluster_status(
        &self,
        key: &ObjectKey,
        status: &StorageClusterStatus,
    ) -> Result<()>;
}
