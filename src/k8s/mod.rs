/// Kubernetes cluster access
pub mod client;
pub mod kubeconfig;

pub use client::{ClusterApi, KubernetesClient};
pub use kubeconfig::KubeconfigWorkspace;
