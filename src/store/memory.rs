//! In-Memory Cluster Store
//!
//! DashMap-backed [`ClusterStore`] used by the bootstrap test suite. Tracks
//! per-operation call counts and supports injecting create failures by
//! object name so retry behavior can be exercised without a real API server.

use crate::crd::StorageClusterStatus;
use crate::error::{Error, Result};
use crate::store::{ClusterStore, ObjectKey};
use async_trait::async_trait;
use dashmap::DashMap;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::api::storage::v1::StorageClass;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process cluster store
#[derive(Default)]
pub struct MemoryStore {
    config_maps: DashMap<String, ConfigMap>,
    secrets: DashMap<String, Secret>,
    storage_classes: DashMap<String, StorageClass>,
    cluster_statuses: DashMap<String, StorageClusterStatus>,
    /// Object names whose creation fails with an injected backend error
    create_failures: DashMap<String, ()>,
    secret_gets: AtomicU64,
    creates: AtomicU64,
    config_map_updates: AtomicU64,
}

fn slot(key: &ObjectKey) -> String {
    key.to_string()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Seeding & Inspection
    // =========================================================================

    /// Seed a config map without counting it as a create
    pub fn put_config_map(&self, config_map: ConfigMap) {
        let key = ObjectKey::from_meta(&config_map.metadata).expect("seeded object needs a name");
        self.config_maps.insert(slot(&key), config_map);
    }

    /// Seed a secret without counting it as a create
    pub fn put_secret(&self, secret: Secret) {
        let key = ObjectKey::from_meta(&secret.metadata).expect("seeded object needs a name");
        self.secrets.insert(slot(&key), secret);
    }

    pub fn remove_secret(&self, key: &ObjectKey) {
        self.secrets.remove(&slot(key));
    }

    pub fn config_map(&self, key: &ObjectKey) -> Option<ConfigMap> {
        self.config_maps.get(&slot(key)).map(|e| e.clone())
    }

    pub fn secret(&self, key: &ObjectKey) -> Option<Secret> {
        self.secrets.get(&slot(key)).map(|e| e.clone())
    }

    pub fn storage_class(&self, name: &str) -> Option<StorageClass> {
        self.storage_classes.get(name).map(|e| e.clone())
    }

    pub fn storage_class_count(&self) -> usize {
        self.storage_classes.len()
    }

    pub fn cluster_status(&self, key: &ObjectKey) -> Option<StorageClusterStatus> {
        self.cluster_statuses.get(&slot(key)).map(|e| e.clone())
    }

    // =========================================================================
    // Failure Injection & Counters
    // =========================================================================

    /// Make every create of the named object fail until [`heal`] is called
    pub fn fail_create(&self, name: &str) {
        self.create_failures.insert(name.to_string(), ());
    }

    /// Clear an injected create failure
    pub fn heal(&self, name: &str) {
        self.create_failures.remove(name);
    }

    pub fn secret_get_count(&self) -> u64 {
        self.secret_gets.load(Ordering::Relaxed)
    }

    pub fn create_count(&self) -> u64 {
        self.creates.load(Ordering::Relaxed)
    }

    pub fn config_map_update_count(&self) -> u64 {
        self.config_map_updates.load(Ordering::Relaxed)
    }

    fn check_create(&self, kind: &str, key: &ObjectKey, occupied: bool) -> Result<()> {
        if self.create_failures.contains_key(&key.name) {
            return Err(Error::Internal(format!(
                "injected create failure for {}",
                key.name
            )));
        }
        if occupied {
            return Err(Error::ResourceExists {
                kind: kind.into(),
                name: key.name.clone(),
            });
        }
        self.creates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl ClusterStore for MemoryStore {
    async fn get_config_map(&self, key: &ObjectKey) -> Result<Option<ConfigMap>> {
        Ok(self.config_map(key))
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let key = ObjectKey::from_meta(&config_map.metadata)?;
        self.check_create("ConfigMap", &key, self.config_maps.contains_key(&slot(&key)))?;
        self.config_maps.insert(slot(&key), config_map.clone());
        Ok(())
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let key = ObjectKey::from_meta(&config_map.metadata)?;
        if !self.config_maps.contains_key(&slot(&key)) {
            return Err(Error::ResourceNotFound {
                kind: "ConfigMap".into(),
                name: key.name,
            });
        }
        self.config_map_updates.fetch_add(1, Ordering::Relaxed);
        self.config_maps.insert(slot(&key), config_map.clone());
        Ok(())
    }

    async fn get_secret(&self, key: &ObjectKey) -> Result<Option<Secret>> {
        self.secret_gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.secret(key))
    }

    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        let key = ObjectKey::from_meta(&secret.metadata)?;
        self.check_create("Secret", &key, self.secrets.contains_key(&slot(&key)))?;
        self.secrets.insert(slot(&key), secret.clone());
        Ok(())
    }

    async fn get_storage_class(&self, key: &ObjectKey) -> Result<Option<StorageClass>> {
        Ok(self.storage_class(&key.name))
    }

    async fn create_storage_class(&self, storage_class: &StorageClass) -> Result<()> {
        let key = ObjectKey::from_meta(&storage_class.metadata)?;
        self.check_create(
            "StorageClass",
            &key,
            self.storage_classes.contains_key(&key.name),
        )?;
        self.storage_classes.insert(key.name, storage_class.clone());
        Ok(())
    }

    async fn patch_cluster_status(
        &self,
        key: &ObjectKey,
        status: &StorageClusterStatus,
    ) -> Result<()> {
        self.cluster_statuses.insert(slot(key), status.clone());
        Ok(())
    }
}
