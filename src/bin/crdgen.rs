//! Emit the StorageCluster CRD as YAML for cluster installation

use kube::CustomResourceExt;
use storage_cluster_operator::StorageCluster;

fn main() -> Result<(), serde_yaml::Error> {
    print!("{}", serde_yaml::to_string(&StorageCluster::crd())?);
    Ok(())
}
