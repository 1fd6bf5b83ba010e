//! Storage-Class Templates
//!
//! Builds the three canonical storage-class skeletons (filesystem, block,
//! object gateway) with empty parameter maps. The materializer merges bundle
//! data into them and only templates actually referenced by a bundle entry
//! are ever created.

use crate::external::{
    CEPHFS_STORAGE_CLASS_NAME, CEPH_RBD_STORAGE_CLASS_NAME, CEPH_RGW_STORAGE_CLASS_NAME,
};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

// =============================================================================
// Storage Class Role
// =============================================================================

/// Role of a storage class in the external cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageClassRole {
    Filesystem,
    Block,
    ObjectGateway,
}

impl StorageClassRole {
    /// Map a bundle storage-class name to its role; names outside the
    /// recognized set return `None`
    pub fn from_class_name(name: &str) -> Option<Self> {
        match name {
            CEPHFS_STORAGE_CLASS_NAME => Some(StorageClassRole::Filesystem),
            CEPH_RBD_STORAGE_CLASS_NAME => Some(StorageClassRole::Block),
            CEPH_RGW_STORAGE_CLASS_NAME => Some(StorageClassRole::ObjectGateway),
            _ => None,
        }
    }

    /// Canonical object name for this role's storage class
    pub fn class_name(&self) -> &'static str {
        match self {
            StorageClassRole::Filesystem => CEPHFS_STORAGE_CLASS_NAME,
            StorageClassRole::Block => CEPH_RBD_STORAGE_CLASS_NAME,
            StorageClassRole::ObjectGateway => CEPH_RGW_STORAGE_CLASS_NAME,
        }
    }

    /// Provisioner identifier as deployed by Rook. CSI driver names embed
    /// the operator namespace; the bucket provisioner does not.
    pub fn provisioner(&self, namespace: &str) -> String {
        match self {
            StorageClassRole::Filesystem => format!("{}.cephfs.csi.ceph.com", namespace),
            StorageClassRole::Block => format!("{}.rbd.csi.ceph.com", namespace),
            StorageClassRole::ObjectGateway => "ceph.rook.io/bucket".to_string(),
        }
    }
}

impl std::fmt::Display for StorageClassRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageClassRole::Filesystem => write!(f, "filesystem"),
            StorageClassRole::Block => write!(f, "block"),
            StorageClassRole::ObjectGateway => write!(f, "object-gateway"),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// One role-tagged storage-class skeleton awaiting parameter merge
#[derive(Debug, Clone)]
pub struct StorageClassTemplate {
    pub role: StorageClassRole,
    class: StorageClass,
    activated: bool,
}

impl StorageClassTemplate {
    fn new(role: StorageClassRole, namespace: &str) -> Self {
        Self {
            role,
            class: StorageClass {
                metadata: ObjectMeta {
                    name: Some(role.class_name().to_string()),
                    ..Default::default()
                },
                provisioner: role.provisioner(namespace),
                parameters: Some(BTreeMap::new()),
                reclaim_policy: Some("Delete".to_string()),
                ..Default::default()
            },
            activated: false,
        }
    }

    /// Merge bundle data into the parameter map; later keys win
    pub fn merge_parameters(&mut self, data: &BTreeMap<String, String>) {
        self.class
            .parameters
            .get_or_insert_with(BTreeMap::new)
            .extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Queue this template for creation
    pub fn activate(&mut self) {
        self.activated = true;
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn parameters(&self) -> Option<&BTreeMap<String, String>> {
        self.class.parameters.as_ref()
    }

    pub fn class(&self) -> &StorageClass {
        &self.class
    }
}

/// The three per-pass templates, one named field per role
#[derive(Debug, Clone)]
pub struct StorageClassTemplates {
    pub filesystem: StorageClassTemplate,
    pub block: StorageClassTemplate,
    pub object_gateway: StorageClassTemplate,
}

impl StorageClassTemplates {
    /// Build fresh skeletons with empty parameter maps
    pub fn new(namespace: &str) -> Self {
        Self {
            filesystem: StorageClassTemplate::new(StorageClassRole::Filesystem, namespace),
            block: StorageClassTemplate::new(StorageClassRole::Block, namespace),
            object_gateway: StorageClassTemplate::new(StorageClassRole::ObjectGateway, namespace),
        }
    }

    pub fn get_mut(&mut self, role: StorageClassRole) -> &mut StorageClassTemplate {
        match role {
            StorageClassRole::Filesystem => &mut self.filesystem,
            StorageClassRole::Block => &mut self.block,
            StorageClassRole::ObjectGateway => &mut self.object_gateway,
        }
    }

    /// Consume the set, yielding only the storage classes a bundle entry
    /// actually referenced
    pub fn into_activated(self) -> Vec<StorageClass> {
        [self.filesystem, self.block, self.object_gateway]
            .into_iter()
            .filter(|t| t.activated)
            .map(|t| t.class)
            .collect()
    }
}
