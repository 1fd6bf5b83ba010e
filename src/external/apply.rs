//! Idempotent Applier
//!
//! Fetch-or-create for bootstrap objects: an object that already exists is
//! left untouched (bootstrap never updates after first creation), a missing
//! object is created, and an "already exists" race on create counts as
//! success. Every other fetch or create failure propagates verbatim.

use crate::error::Result;
use crate::store::{ClusterStore, ObjectKey};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::api::storage::v1::StorageClass;
use tracing::{debug, info};

// =============================================================================
// Ensurable Object
// =============================================================================

/// Object kinds the applier knows how to fetch and create through a
/// [`ClusterStore`]
#[async_trait]
pub trait EnsurableObject: Sized + Send + Sync {
    const KIND: &'static str;

    async fn fetch(store: &dyn ClusterStore, key: &ObjectKey) -> Result<Option<Self>>;

    async fn create(store: &dyn ClusterStore, desired: &Self) -> Result<()>;
}

#[async_trait]
impl EnsurableObject for ConfigMap {
    const KIND: &'static str = "ConfigMap";

    async fn fetch(store: &dyn ClusterStore, key: &ObjectKey) -> Result<Option<Self>> {
        store.get_config_map(key).await
    }

    async fn create(store: &dyn ClusterStore, desired: &Self) -> Result<()> {
        store.create_config_map(desired).await
    }
}

#[async_trait]
impl EnsurableObject for Secret {
    const KIND: &'static str = "Secret";

    async fn fetch(store: &dyn ClusterStore, key: &ObjectKey) -> Result<Option<Self>> {
        store.get_secret(key).await
    }

    async fn create(store: &dyn ClusterStore, desired: &Self) -> Result<()> {
        store.create_secret(desired).await
    }
}

#[async_trait]
impl EnsurableObject for StorageClass {
    const KIND: &'static str = "StorageClass";

    async fn fetch(store: &dyn ClusterStore, key: &ObjectKey) -> Result<Option<Self>> {
        store.get_storage_class(key).await
    }

    async fn create(store: &dyn ClusterStore, desired: &Self) -> Result<()> {
        store.create_storage_class(desired).await
    }
}

// =============================================================================
// Ensure Exists
// =============================================================================

/// Create `desired` under `key` unless an object already exists there.
///
/// A fetch failure other than not-found is never treated as absence; it
/// aborts the pass so a degraded backend cannot trigger spurious creates.
pub async fn ensure_exists<K: EnsurableObject>(
    store: &dyn ClusterStore,
    key: &ObjectKey,
    desired: &K,
) -> Result<()> {
    if K::fetch(store, key).await?.is_some() {
        debug!(kind = K::KIND, object = %key, "already present, skipping create");
        return Ok(());
    }
    info!(kind = K::KIND, object = %key, "creating bootstrap object");
    match K::create(store, desired).await {
        Err(err) if err.is_already_exists() => {
            debug!(kind = K::KIND, object = %key, "created concurrently, treating as success");
            Ok(())
        }
        other => other,
    }
}
