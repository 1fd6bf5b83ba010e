//! Storage Cluster Operator - External Mode Bootstrap
//!
//! A Kubernetes operator that connects a StorageCluster resource to an
//! externally managed Ceph cluster. The cluster's connection material is
//! published as a single bundle secret by an exporter script; this operator
//! materializes it exactly once into live resources.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  StorageCluster Controller                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Bootstrap Gate (one-shot, status-flag guarded)              │
//! │      │                                                       │
//! │      ├── bundle secret ──► ExternalResource descriptors      │
//! │      │                                                       │
//! │      └── Bundle Materializer                                 │
//! │             ├── ConfigMaps / Secrets (owned, idempotent)     │
//! │             ├── StorageClasses (cluster-scoped, unowned)     │
//! │             └── ROOK_CSI_ENABLE_CEPHFS capability flag       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ClusterStore seam: KubeStore (API server) / MemoryStore     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`external`]: bundle parsing, templates, idempotent apply, bootstrap
//! - [`controller`]: kube runtime wiring around the bootstrap gate
//! - [`store`]: object-store seam and its adapters
//! - [`crd`]: the StorageCluster custom resource
//! - [`error`]: error types and requeue policy

pub mod controller;
pub mod crd;
pub mod error;
pub mod external;
pub mod store;

// Re-export commonly used types
pub use controller::Context;

pub use crd::{
    ClusterPhase, ExternalSpec, StorageCluster, StorageClusterSpec, StorageClusterStatus,
};

pub use error::{Error, ErrorAction, Result};

pub use external::{
    ensure_exists, ensure_external_resources, materialize, parse_bundle, ExternalResource,
    MaterializeOutcome, ResourceKind, StorageClassRole, StorageClassTemplates,
};

pub use store::{ClusterStore, KubeStore, MemoryStore, ObjectKey};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
