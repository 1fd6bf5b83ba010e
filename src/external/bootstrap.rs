//! Bootstrap Gate
//!
//! One-shot entry point for external mode. Guarded by the persisted
//! `externalSecretFound` status flag: while false every pass is safe to
//! retry wholesale (all creation is idempotent), and the flag is flipped
//! only after the whole bundle materialized, making it the single commit
//! point. Once true, the gate returns without any I/O.

use crate::crd::{ClusterPhase, StorageCluster};
use crate::error::{Error, Result};
use crate::external::materialize::{materialize, MaterializeOutcome};
use crate::external::resource::parse_bundle;
use crate::external::{EXTERNAL_CLUSTER_DETAILS_KEY, EXTERNAL_CLUSTER_DETAILS_SECRET};
use crate::store::{ClusterStore, ObjectKey};
use chrono::Utc;
use kube::ResourceExt;
use tracing::{debug, info};

/// Ensure the external bundle is materialized for `cluster`.
///
/// Returns `Ok(None)` when a prior pass already completed, otherwise the
/// outcome of the pass it ran. A missing or unparseable bundle fails the
/// pass; nothing partial is ever committed as done.
pub async fn ensure_external_resources(
    store: &dyn ClusterStore,
    cluster: &StorageCluster,
) -> Result<Option<MaterializeOutcome>> {
    if cluster.bootstrap_complete() {
        debug!(cluster = %cluster.name_any(), "external bundle already materialized");
        return Ok(None);
    }

    let namespace = cluster
        .namespace()
        .ok_or_else(|| Error::MissingMetadata("namespace".into()))?;

    let bundle_key = ObjectKey::namespaced(EXTERNAL_CLUSTER_DETAILS_SECRET, &namespace);
    let bundle = store
        .get_secret(&bundle_key)
        .await?
        .ok_or_else(|| Error::BundleUnavailable {
            name: EXTERNAL_CLUSTER_DETAILS_SECRET.into(),
            namespace: namespace.clone(),
        })?;

    let payload = bundle
        .data
        .as_ref()
        .and_then(|data| data.get(EXTERNAL_CLUSTER_DETAILS_KEY))
        .ok_or_else(|| Error::BundleKeyMissing {
            secret: EXTERNAL_CLUSTER_DETAILS_SECRET.into(),
            key: EXTERNAL_CLUSTER_DETAILS_KEY.into(),
        })?;

    let resources = parse_bundle(&payload.0)?;
    info!(
        cluster = %cluster.name_any(),
        entries = resources.len(),
        "materializing external cluster bundle"
    );

    let outcome = materialize(store, cluster, &resources).await?;

    // Commit point: flipped only after complete success
    let mut status = cluster.status.clone().unwrap_or_default();
    status.external_secret_found = true;
    status.phase = Some(ClusterPhase::Ready);
    status.last_transition = Some(Utc::now());
    let cluster_key = ObjectKey::namespaced(cluster.name_any(), &namespace);
    store.patch_cluster_status(&cluster_key, &status).await?;

    Ok(Some(outcome))
}
