//! Bundle Materializer
//!
//! Walks the decoded bundle in order, creating config maps and connection
//! secrets (owned by the StorageCluster), merging storage-class parameters
//! into the role templates, and deriving the CephFS CSI capability flag.
//! Storage classes are cluster-scoped and deliberately carry no owner
//! reference: they must outlive the namespaced cluster identity.

use crate::crd::StorageCluster;
use crate::error::{Error, Result};
use crate::external::apply::ensure_exists;
use crate::external::resource::{ExternalResource, ResourceKind};
use crate::external::templates::{StorageClassRole, StorageClassTemplates};
use crate::external::{RGW_ENDPOINT_KEY, ROOK_ENABLE_CEPHFS_CSI_KEY, ROOK_OPERATOR_CONFIG_NAME};
use crate::store::{ClusterStore, ObjectKey};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::Resource;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

// =============================================================================
// Materialize Outcome
// =============================================================================

/// Pass-scoped results of one materialization, returned to the caller
/// instead of being parked in process-wide state.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOutcome {
    /// True iff the bundle carried a filesystem storage class; mirrored into
    /// the shared operator config as `ROOK_CSI_ENABLE_CEPHFS`
    pub cephfs_enabled: bool,

    /// RGW endpoint from the object-gateway entry, colons replaced with
    /// underscores so it is usable as a label value downstream
    pub rgw_endpoint: Option<String>,
}

/// Label values reject colons; `10.0.0.5:8080` becomes `10.0.0.5_8080`
fn sanitize_endpoint(endpoint: &str) -> String {
    endpoint.replace(':', "_")
}

fn owner_reference(cluster: &StorageCluster) -> Result<OwnerReference> {
    let meta = cluster.meta();
    Ok(OwnerReference {
        api_version: StorageCluster::api_version(&()).into_owned(),
        kind: StorageCluster::kind(&()).into_owned(),
        name: meta
            .name
            .clone()
            .ok_or_else(|| Error::MissingMetadata("name".into()))?,
        uid: meta
            .uid
            .clone()
            .ok_or_else(|| Error::MissingMetadata("uid".into()))?,
        ..Default::default()
    })
}

fn child_meta(name: &str, namespace: &str, owner: &OwnerReference) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        owner_references: Some(vec![owner.clone()]),
        ..Default::default()
    }
}

// =============================================================================
// Materialize
// =============================================================================

/// Materialize the bundle: create every described object idempotently and
/// derive the capability flag. Any single failure aborts the pass; a retry
/// re-derives the same desired state and safely re-applies.
pub async fn materialize(
    store: &dyn ClusterStore,
    cluster: &StorageCluster,
    resources: &[ExternalResource],
) -> Result<MaterializeOutcome> {
    let namespace = cluster
        .meta()
        .namespace
        .clone()
        .ok_or_else(|| Error::MissingMetadata("namespace".into()))?;
    let owner = owner_reference(cluster)?;

    let mut templates = StorageClassTemplates::new(&namespace);
    let mut rgw_endpoint = None;

    for resource in resources {
        match resource.kind {
            ResourceKind::ConfigMap => {
                let desired = ConfigMap {
                    metadata: child_meta(&resource.name, &namespace, &owner),
                    data: Some(resource.data.clone()),
                    ..Default::default()
                };
                let key = ObjectKey::namespaced(&resource.name, &namespace);
                ensure_exists(store, &key, &desired).await?;
            }
            ResourceKind::Secret => {
                // Secret values are opaque bytes, not text
                let data: BTreeMap<String, ByteString> = resource
                    .data
                    .iter()
                    .map(|(k, v)| (k.clone(), ByteString(v.clone().into_bytes())))
                    .collect();
                let desired = Secret {
                    metadata: child_meta(&resource.name, &namespace, &owner),
                    data: Some(data),
                    ..Default::default()
                };
                let key = ObjectKey::namespaced(&resource.name, &namespace);
                ensure_exists(store, &key, &desired).await?;
            }
            ResourceKind::StorageClass => {
                let Some(role) = StorageClassRole::from_class_name(&resource.name) else {
                    warn!(name = %resource.name, "ignoring storage class with unrecognized name");
                    continue;
                };
                if role == StorageClassRole::ObjectGateway {
                    if let Some(endpoint) = resource.data.get(RGW_ENDPOINT_KEY) {
                        rgw_endpoint = Some(sanitize_endpoint(endpoint));
                    }
                }
                let template = templates.get_mut(role);
                template.merge_parameters(&resource.data);
                template.activate();
            }
            ResourceKind::Unknown => {
                warn!(name = %resource.name, "ignoring bundle entry of unrecognized kind");
            }
        }
    }

    let cephfs_enabled = templates.filesystem.is_activated();

    // Only the storage classes the bundle actually referenced
    for class in templates.into_activated() {
        let key = ObjectKey::from_meta(&class.metadata)?;
        ensure_exists(store, &key, &class).await?;
    }

    set_cephfs_csi_flag(store, &namespace, cephfs_enabled).await?;

    info!(
        cephfs_enabled,
        rgw_endpoint = rgw_endpoint.as_deref().unwrap_or("-"),
        "external bundle materialized"
    );
    Ok(MaterializeOutcome {
        cephfs_enabled,
        rgw_endpoint,
    })
}

/// Mirror the capability flag into the shared Rook operator config. Skips
/// the write when the persisted value already matches, to avoid reconcile
/// churn on the operator deployment.
async fn set_cephfs_csi_flag(
    store: &dyn ClusterStore,
    namespace: &str,
    enabled: bool,
) -> Result<()> {
    let key = ObjectKey::namespaced(ROOK_OPERATOR_CONFIG_NAME, namespace);
    let mut config = store
        .get_config_map(&key)
        .await?
        .ok_or_else(|| Error::ResourceNotFound {
            kind: "ConfigMap".into(),
            name: ROOK_OPERATOR_CONFIG_NAME.into(),
        })?;

    let desired = enabled.to_string();
    let data = config.data.get_or_insert_with(BTreeMap::new);
    if data.get(ROOK_ENABLE_CEPHFS_CSI_KEY) == Some(&desired) {
        debug!(%desired, "CephFS CSI flag already current, skipping update");
        return Ok(());
    }
    data.insert(ROOK_ENABLE_CEPHFS_CSI_KEY.to_string(), desired.clone());
    info!(%desired, "updating CephFS CSI flag");
    store.update_config_map(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ExternalSpec, StorageClusterSpec};
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    const NAMESPACE: &str = "rook-external";

    fn test_cluster() -> StorageCluster {
        let mut cluster = StorageCluster::new(
            "external-cluster",
            StorageClusterSpec {
                external: ExternalSpec { enable: true },
            },
        );
        cluster.meta_mut().namespace = Some(NAMESPACE.into());
        cluster.meta_mut().uid = Some("7c330f64-29f8-4a0b-93c1-1d4bbabb7a1f".into());
        cluster
    }

    fn seed_operator_config(store: &MemoryStore, flag: Option<&str>) {
        let mut data = BTreeMap::new();
        if let Some(value) = flag {
            data.insert(ROOK_ENABLE_CEPHFS_CSI_KEY.to_string(), value.to_string());
        }
        store.put_config_map(ConfigMap {
            metadata: ObjectMeta {
                name: Some(ROOK_OPERATOR_CONFIG_NAME.into()),
                namespace: Some(NAMESPACE.into()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        });
    }

    fn descriptor(kind: ResourceKind, name: &str, entries: &[(&str, &str)]) -> ExternalResource {
        ExternalResource {
            kind,
            name: name.into(),
            data: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn operator_flag(store: &MemoryStore) -> Option<String> {
        let key = ObjectKey::namespaced(ROOK_OPERATOR_CONFIG_NAME, NAMESPACE);
        store
            .config_map(&key)
            .and_then(|cm| cm.data)
            .and_then(|d| d.get(ROOK_ENABLE_CEPHFS_CSI_KEY).cloned())
    }

    #[tokio::test]
    async fn test_scenario_bundle() {
        let store = MemoryStore::new();
        seed_operator_config(&store, Some("false"));
        let cluster = test_cluster();
        let resources = vec![
            descriptor(
                ResourceKind::Secret,
                "rook-ceph-external-cluster-details-secret",
                &[("token", "abc")],
            ),
            descriptor(ResourceKind::StorageClass, "cephfs", &[("pool", "p1")]),
        ];

        let outcome = materialize(&store, &cluster, &resources).await.unwrap();
        assert!(outcome.cephfs_enabled);

        let secret_key =
            ObjectKey::namespaced("rook-ceph-external-cluster-details-secret", NAMESPACE);
        let secret = store.secret(&secret_key).unwrap();
        assert_eq!(secret.data.unwrap()["token"].0, b"abc".to_vec());

        let class = store.storage_class("cephfs").unwrap();
        assert_eq!(class.parameters.as_ref().unwrap()["pool"], "p1");
        assert_eq!(store.storage_class_count(), 1);

        assert_eq!(operator_flag(&store).as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_children_owned_classes_unowned() {
        let store = MemoryStore::new();
        seed_operator_config(&store, None);
        let cluster = test_cluster();
        let resources = vec![
            descriptor(
                ResourceKind::ConfigMap,
                "rook-ceph-mon-endpoints",
                &[("data", "a=10.0.0.1:6789")],
            ),
            descriptor(ResourceKind::StorageClass, "ceph-rbd", &[("pool", "rbd")]),
        ];
        materialize(&store, &cluster, &resources).await.unwrap();

        let cm_key = ObjectKey::namespaced("rook-ceph-mon-endpoints", NAMESPACE);
        let owners = store
            .config_map(&cm_key)
            .unwrap()
            .metadata
            .owner_references
            .unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].kind, "StorageCluster");
        assert_eq!(owners[0].name, "external-cluster");

        let class = store.storage_class("ceph-rbd").unwrap();
        assert!(class.metadata.owner_references.is_none());
    }

    #[tokio::test]
    async fn test_activation_filter() {
        let store = MemoryStore::new();
        seed_operator_config(&store, None);
        let cluster = test_cluster();
        let resources = vec![descriptor(
            ResourceKind::StorageClass,
            "ceph-rbd",
            &[("pool", "rbd")],
        )];

        let outcome = materialize(&store, &cluster, &resources).await.unwrap();
        assert!(!outcome.cephfs_enabled);
        assert_eq!(store.storage_class_count(), 1);
        assert!(store.storage_class("ceph-rbd").is_some());
        assert_eq!(operator_flag(&store).as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_flag_write_skipped_when_current() {
        let store = MemoryStore::new();
        seed_operator_config(&store, Some("false"));
        let cluster = test_cluster();

        materialize(&store, &cluster, &[]).await.unwrap();
        assert_eq!(store.config_map_update_count(), 0);
        assert_eq!(operator_flag(&store).as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_missing_operator_config_fails_pass() {
        let store = MemoryStore::new();
        let cluster = test_cluster();

        let err = materialize(&store, &cluster, &[]).await.unwrap_err();
        assert_matches!(err, Error::ResourceNotFound { .. });
    }

    #[tokio::test]
    async fn test_rgw_endpoint_sanitized() {
        let store = MemoryStore::new();
        seed_operator_config(&store, None);
        let cluster = test_cluster();
        let resources = vec![descriptor(
            ResourceKind::StorageClass,
            "ceph-rgw",
            &[("endpoint", "10.0.0.5:8080")],
        )];

        let outcome = materialize(&store, &cluster, &resources).await.unwrap();
        assert_eq!(outcome.rgw_endpoint.as_deref(), Some("10.0.0.5_8080"));

        let class = store.storage_class("ceph-rgw").unwrap();
        assert_eq!(class.parameters.as_ref().unwrap()["endpoint"], "10.0.0.5:8080");
    }

    #[tokio::test]
    async fn test_unrecognized_entries_ignored() {
        let store = MemoryStore::new();
        seed_operator_config(&store, None);
        let cluster = test_cluster();
        let resources = vec![
            descriptor(ResourceKind::Unknown, "replicapool", &[("size", "3")]),
            descriptor(ResourceKind::StorageClass, "ebs-gp3", &[("iops", "3000")]),
        ];

        materialize(&store, &cluster, &resources).await.unwrap();
        assert_eq!(store.storage_class_count(), 0);
        assert_eq!(store.create_count(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_then_retry() {
        let store = MemoryStore::new();
        seed_operator_config(&store, None);
        let cluster = test_cluster();
        let resources = vec![
            descriptor(ResourceKind::ConfigMap, "rook-ceph-mon-endpoints", &[]),
            descriptor(ResourceKind::Secret, "rook-ceph-admin-keyring", &[("keyring", "k")]),
            descriptor(ResourceKind::StorageClass, "cephfs", &[("fsName", "fs")]),
        ];

        store.fail_create("rook-ceph-admin-keyring");
        let err = materialize(&store, &cluster, &resources).await.unwrap_err();
        assert_matches!(err, Error::Internal(_));
        // First object landed, nothing after the failure did
        assert_eq!(store.storage_class_count(), 0);

        store.heal("rook-ceph-admin-keyring");
        materialize(&store, &cluster, &resources).await.unwrap();

        let secret_key = ObjectKey::namespaced("rook-ceph-admin-keyring", NAMESPACE);
        assert!(store.secret(&secret_key).is_some());
        assert_eq!(store.storage_class_count(), 1);
        // ConfigMap was created exactly once across both passes
        assert_eq!(store.create_count(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_role_descriptors_merge() {
        let store = MemoryStore::new();
        seed_operator_config(&store, None);
        let cluster = test_cluster();
        let resources = vec![
            descriptor(ResourceKind::StorageClass, "ceph-rbd", &[("pool", "old")]),
            descriptor(
                ResourceKind::StorageClass,
                "ceph-rbd",
                &[("pool", "new"), ("clusterID", "x")],
            ),
        ];

        materialize(&store, &cluster, &resources).await.unwrap();
        let parameters = store.storage_class("ceph-rbd").unwrap().parameters.unwrap();
        assert_eq!(parameters["pool"], "new");
        assert_eq!(parameters["clusterID"], "x");
        assert_eq!(store.storage_class_count(), 1);
    }
}
