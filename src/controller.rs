//! StorageCluster Controller
//!
//! Thin reconciliation wrapper around the bootstrap gate. The kube runtime
//! serializes reconciles per object, so the gate never runs concurrently for
//! one cluster. Error-to-requeue mapping comes from [`Error::action`].

use crate::crd::StorageCluster;
use crate::error::{Error, ErrorAction, Result};
use crate::external::ensure_external_resources;
use crate::store::{ClusterStore, KubeStore};
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::{Action, Controller};
use kube::runtime::watcher;
use kube::{Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Fallback requeue interval for transient backend errors
const BACKOFF_REQUEUE: Duration = Duration::from_secs(15);

// =============================================================================
// Context
// =============================================================================

/// Shared state for all reconciles
pub struct Context {
    pub store: Arc<dyn ClusterStore>,
    /// Sanitized RGW endpoint from the last successful bootstrap pass; read
    /// by the downstream object-store labeling step
    rgw_endpoint: RwLock<Option<String>>,
}

impl Context {
    pub fn new(store: Arc<dyn ClusterStore>) -> Self {
        Self {
            store,
            rgw_endpoint: RwLock::new(None),
        }
    }

    pub async fn rgw_endpoint(&self) -> Option<String> {
        self.rgw_endpoint.read().await.clone()
    }
}

// =============================================================================
// Reconcile
// =============================================================================

/// Reconcile one StorageCluster
pub async fn reconcile(
    cluster: Arc<StorageCluster>,
    ctx: Arc<Context>,
) -> std::result::Result<Action, Error> {
    if !cluster.spec.external.enable {
        debug!(cluster = %cluster.name_any(), "not in external mode, nothing to do");
        return Ok(Action::await_change());
    }

    if let Some(outcome) = ensure_external_resources(ctx.store.as_ref(), &cluster).await? {
        if let Some(endpoint) = outcome.rgw_endpoint {
            *ctx.rgw_endpoint.write().await = Some(endpoint);
        }
        info!(
            cluster = %cluster.name_any(),
            cephfs_enabled = outcome.cephfs_enabled,
            "external bootstrap complete"
        );
    }
    Ok(Action::await_change())
}

/// Map a reconcile error to a requeue action
pub fn error_policy(cluster: Arc<StorageCluster>, err: &Error, _ctx: Arc<Context>) -> Action {
    warn!(cluster = %cluster.name_any(), error = %err, "reconcile failed");
    match err.action() {
        ErrorAction::RequeueWithBackoff => Action::requeue(BACKOFF_REQUEUE),
        ErrorAction::RequeueAfter(duration) => Action::requeue(duration),
        ErrorAction::NoRequeue => Action::await_change(),
    }
}

/// Run the controller until the watch stream ends
pub async fn run(client: Client, namespace: Option<String>) -> Result<()> {
    let clusters: Api<StorageCluster> = match namespace.as_deref() {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    let context = Arc::new(Context::new(Arc::new(KubeStore::new(client))));

    Controller::new(clusters, watcher::Config::default())
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _action)) => debug!(object = %object.name, "reconciled"),
                Err(err) => warn!(error = %err, "reconcile stream error"),
            }
        })
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{ExternalSpec, StorageClusterSpec};
    use crate::external::{
        EXTERNAL_CLUSTER_DETAILS_KEY, EXTERNAL_CLUSTER_DETAILS_SECRET, ROOK_OPERATOR_CONFIG_NAME,
    };
    use crate::store::MemoryStore;
    use k8s_openapi::api::core::v1::{ConfigMap, Secret};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::ByteString;
    use kube::Resource;
    use std::collections::BTreeMap;

    const NAMESPACE: &str = "rook-external";

    fn test_cluster(external: bool) -> StorageCluster {
        let mut cluster = StorageCluster::new(
            "external-cluster",
            StorageClusterSpec {
                external: ExternalSpec { enable: external },
            },
        );
        cluster.meta_mut().namespace = Some(NAMESPACE.into());
        cluster.meta_mut().uid = Some("7c330f64-29f8-4a0b-93c1-1d4bbabb7a1f".into());
        cluster
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let payload = br#"[{"kind": "StorageClass", "name": "ceph-rgw", "data": {"endpoint": "10.0.0.5:8080"}}]"#;
        let mut data = BTreeMap::new();
        data.insert(
            EXTERNAL_CLUSTER_DETAILS_KEY.to_string(),
            ByteString(payload.to_vec()),
        );
        store.put_secret(Secret {
            metadata: ObjectMeta {
                name: Some(EXTERNAL_CLUSTER_DETAILS_SECRET.into()),
                namespace: Some(NAMESPACE.into()),
                ..Default::default()
            },
            data: Some(data),
            ..Default::default()
        });
        store.put_config_map(ConfigMap {
            metadata: ObjectMeta {
                name: Some(ROOK_OPERATOR_CONFIG_NAME.into()),
                namespace: Some(NAMESPACE.into()),
                ..Default::default()
            },
            data: Some(BTreeMap::new()),
            ..Default::default()
        });
        store
    }

    #[tokio::test]
    async fn test_reconcile_skips_internal_mode() {
        let store = seeded_store();
        let ctx = Arc::new(Context::new(store.clone()));

        reconcile(Arc::new(test_cluster(false)), ctx).await.unwrap();
        assert_eq!(store.create_count(), 0);
        assert_eq!(store.secret_get_count(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_publishes_rgw_endpoint() {
        let store = seeded_store();
        let ctx = Arc::new(Context::new(store.clone()));

        reconcile(Arc::new(test_cluster(true)), ctx.clone())
            .await
            .unwrap();
        assert_eq!(ctx.rgw_endpoint().await.as_deref(), Some("10.0.0.5_8080"));
        assert_eq!(store.storage_class_count(), 1);
    }

    #[tokio::test]
    async fn test_error_policy_requeues_missing_bundle() {
        let ctx = Arc::new(Context::new(Arc::new(MemoryStore::new())));
        let err = Error::BundleUnavailable {
            name: EXTERNAL_CLUSTER_DETAILS_SECRET.into(),
            namespace: NAMESPACE.into(),
        };
        let action = error_policy(Arc::new(test_cluster(true)), &err, ctx);
        assert_eq!(action, Action::requeue(Duration::from_secs(30)));
    }
}
