//! Kubernetes-backed Cluster Store
//!
//! Implements [`ClusterStore`] against the API server with a kube-rs
//! [`Client`]. Not-found responses on reads surface as `Ok(None)`; every
//! other API failure is propagated verbatim.

use crate::crd::{StorageCluster, StorageClusterStatus};
use crate::error::{Error, Result};
use crate::store::{ClusterStore, ObjectKey};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::api::storage::v1::StorageClass;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;

/// Cluster store backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn storage_classes(&self) -> Api<StorageClass> {
        Api::all(self.client.clone())
    }

    fn clusters(&self, namespace: &str) -> Api<StorageCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn require_namespace(key: &ObjectKey) -> Result<&str> {
        key.namespace
            .as_deref()
            .ok_or_else(|| Error::MissingMetadata(format!("namespace for {}", key.name)))
    }
}

#[async_trait]
impl ClusterStore for KubeStore {
    async fn get_config_map(&self, key: &ObjectKey) -> Result<Option<ConfigMap>> {
        let namespace = Self::require_namespace(key)?;
        Ok(self.config_maps(namespace).get_opt(&key.name).await?)
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let key = ObjectKey::from_meta(&config_map.metadata)?;
        let namespace = Self::require_namespace(&key)?;
        self.config_maps(namespace)
            .create(&PostParams::default(), config_map)
            .await?;
        Ok(())
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<()> {
        let key = ObjectKey::from_meta(&config_map.metadata)?;
        let namespace = Self::require_namespace(&key)?;
        self.config_maps(namespace)
            .replace(&key.name, &PostParams::default(), config_map)
            .await?;
        Ok(())
    }

    async fn get_secret(&self, key: &ObjectKey) -> Result<Option<Secret>> {
        let namespace = Self::require_namespace(key)?;
        Ok(self.secrets(namespace).get_opt(&key.name).await?)
    }

    async fn create_secret(&self, secret: &Secret) -> Result<()> {
        let key = ObjectKey::from_meta(&secret.metadata)?;
        let namespace = Self::require_namespace(&key)?;
        self.secrets(namespace)
            .create(&PostParams::default(), secret)
            .await?;
        Ok(())
    }

    async fn get_storage_class(&self, key: &ObjectKey) -> Result<Option<StorageClass>> {
        Ok(self.storage_classes().get_opt(&key.name).await?)
    }

    async fn create_storage_class(&self, storage_class: &StorageClass) -> Result<()> {
        self.storage_classes()
            .create(&PostParams::default(), storage_class)
            .await?;
        Ok(())
    }

    async fn patch_cluster_status(
        &self,
        key: &ObjectKey,
        status: &StorageClusterStatus,
    ) -> Result<()> {
        let namespace = Self::require_namespace(key)?;
        self.clusters(namespace)
            .patch_status(
                &key.name,
                &PatchParams::default(),
                &Patch::Merge(json!({ "status": status })),
            )
            .await?;
        Ok(())
    }
}
