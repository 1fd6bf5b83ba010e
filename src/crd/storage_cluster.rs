//! StorageCluster CRD
//!
//! Represents a Ceph-backed storage cluster. In external mode the cluster is
//! managed outside Kubernetes and the operator only materializes the
//! connection material published in the external cluster bundle secret.

use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// =============================================================================
// StorageCluster CRD
// =============================================================================

/// StorageCluster describes one storage cluster per namespace. With
/// `external.enable` set, connection details are consumed from the
/// pre-published bundle secret instead of provisioning a cluster in-band.
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "storage.billyronks.io",
    version = "v1",
    kind = "StorageCluster",
    plural = "storageclusters",
    shortname = "stc",
    status = "StorageClusterStatus",
    printcolumn = r#"{"name": "External", "type": "boolean", "jsonPath": ".spec.external.enable"}"#,
    printcolumn = r#"{"name": "Phase", "type": "string", "jsonPath": ".status.phase"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#,
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterSpec {
    /// External cluster settings
    #[serde(default)]
    pub external: ExternalSpec,
}

/// External mode settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSpec {
    /// Consume an externally managed cluster instead of provisioning one
    #[serde(default)]
    pub enable: bool,
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of a StorageCluster
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterStatus {
    /// Current lifecycle phase
    #[serde(default)]
    pub phase: Option<ClusterPhase>,

    /// Whether the external cluster bundle has been found and fully
    /// materialized. Once true, the bootstrap never runs again for this
    /// cluster.
    #[serde(default)]
    pub external_secret_found: bool,

    /// Last status transition time
    #[serde(default)]
    pub last_transition: Option<DateTime<Utc>>,
}

/// Lifecycle phase of a StorageCluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ClusterPhase {
    Pending,
    Progressing,
    Ready,
    Error,
}

impl std::fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterPhase::Pending => write!(f, "Pending"),
            ClusterPhase::Progressing => write!(f, "Progressing"),
            ClusterPhase::Ready => write!(f, "Ready"),
            ClusterPhase::Error => write!(f, "Error"),
        }
    }
}

impl StorageCluster {
    /// Whether the external bundle has already been fully materialized
    pub fn bootstrap_complete(&self) -> bool {
        self.status
            .as_ref()
            .map(|s| s.external_secret_found)
            .unwrap_or(false)
    }
}
