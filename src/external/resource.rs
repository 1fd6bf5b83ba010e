//! External Resource Descriptors
//!
//! Typed form of one entry in the external cluster bundle. The bundle is a
//! JSON array of `{kind, name, data}` objects generated by the exporter
//! script running against the external Ceph cluster.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Resource Kind
// =============================================================================

/// Kind tag of a bundle entry. Kinds added by newer exporters deserialize as
/// [`ResourceKind::Unknown`] and are skipped rather than failing the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceKind {
    ConfigMap,
    Secret,
    StorageClass,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::ConfigMap => write!(f, "ConfigMap"),
            ResourceKind::Secret => write!(f, "Secret"),
            ResourceKind::StorageClass => write!(f, "StorageClass"),
            ResourceKind::Unknown => write!(f, "Unknown"),
        }
    }
}

// =============================================================================
// External Resource
// =============================================================================

/// One parsed entry of the external cluster bundle. Immutable once decoded;
/// duplicate names are kept as-is and resolved by idempotent creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalResource {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Decode the raw bundle payload into its ordered descriptor list
pub fn parse_bundle(payload: &[u8]) -> Result<Vec<ExternalResource>> {
    Ok(serde_json::from_slice(payload)?)
}
