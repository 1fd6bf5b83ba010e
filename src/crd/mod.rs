//! Custom Resource Definitions for the Storage Cluster Operator
//!
//! This module contains all CRD types:
//! - StorageCluster: a Ceph-backed storage cluster, internal or external mode

pub mod storage_cluster;

pub use storage_cluster::*;
