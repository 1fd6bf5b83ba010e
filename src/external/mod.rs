//! External Cluster Bootstrap
//!
//! Materializes the connection material an externally managed Ceph cluster
//! publishes as a single bundle secret: connection secrets, config maps, and
//! storage classes, created exactly once with idempotent semantics.
//!
//! Control flow:
//!
//! ```text
//! bootstrap::ensure_external_resources (one-shot gate, status-flag guarded)
//!     └── fetch + decode bundle secret into ExternalResource descriptors
//!         └── materialize::materialize
//!             ├── templates::StorageClassTemplates (3 role skeletons)
//!             ├── apply::ensure_exists (fetch-or-create per object)
//!             └── ROOK_CSI_ENABLE_CEPHFS flag update (write-if-changed)
//! ```

pub mod apply;
pub mod bootstrap;
pub mod materialize;
pub mod resource;
pub mod templates;

pub use apply::ensure_exists;
pub use bootstrap::ensure_external_resources;
pub use materialize::{materialize, MaterializeOutcome};
pub use resource::{parse_bundle, ExternalResource, ResourceKind};
pub use templates::{StorageClassRole, StorageClassTemplate, StorageClassTemplates};

// =============================================================================
// Well-Known Names
// =============================================================================

/// Secret holding the externally generated cluster bundle
pub const EXTERNAL_CLUSTER_DETAILS_SECRET: &str = "rook-ceph-external-cluster-details";

/// Key inside the bundle secret holding the JSON resource list
pub const EXTERNAL_CLUSTER_DETAILS_KEY: &str = "external_cluster_details";

/// Bundle names selecting a storage-class role
pub const CEPHFS_STORAGE_CLASS_NAME: &str = "cephfs";
pub const CEPH_RBD_STORAGE_CLASS_NAME: &str = "ceph-rbd";
pub const CEPH_RGW_STORAGE_CLASS_NAME: &str = "ceph-rgw";

/// Data key carrying the RGW endpoint in the object-gateway descriptor
pub const RGW_ENDPOINT_KEY: &str = "endpoint";

/// Shared Rook operator config map and the CephFS CSI capability key in it
pub const ROOK_OPERATOR_CONFIG_NAME: &str = "rook-ceph-operator-config";
pub const ROOK_ENABLE_CEPHFS_CSI_KEY: &str = "ROOK_CSI_ENABLE_CEPHFS";
