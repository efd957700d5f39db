/// Kubernetes API client
use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::api::{Api, DeleteParams, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

/// Cluster operations the reaper depends on
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List every pod in a namespace
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>>;

    /// List claims in a namespace matching the given parameters
    async fn list_claims(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> Result<Vec<PersistentVolumeClaim>>;

    /// Delete a claim by name
    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<()>;
}

/// Kubernetes client backed by kube-rs
#[derive(Clone)]
pub struct KubernetesClient {
    inner: Client,
}

impl KubernetesClient {
    /// Create a client from a kubeconfig file, using its current context
    pub async fn from_kubeconfig(path: &Path) -> Result<Self> {
        let kubeconfig = Kubeconfig::read_from(path)
            .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;

        let config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("Failed to build Kubernetes config from kubeconfig")?;

        debug!("Kubernetes API server: {}", config.cluster_url);

        let inner = Client::try_from(config).context("Failed to create Kubernetes client")?;

        Ok(Self { inner })
    }

    fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.inner.clone(), namespace)
    }

    fn claims(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.inner.clone(), namespace)
    }
}

#[async_trait]
impl ClusterApi for KubernetesClient {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        let pods = self
            .pods(namespace)
            .list(&ListParams::default())
            .await
            .with_context(|| format!("Failed to list pods in namespace {}", namespace))?;
        Ok(pods.items)
    }

    async fn list_claims(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> Result<Vec<PersistentVolumeClaim>> {
        let claims = self
            .claims(namespace)
            .list(params)
            .await
            .with_context(|| format!("Failed to list PVCs in namespace {}", namespace))?;
        Ok(claims.items)
    }

    async fn delete_claim(&self, namespace: &str, name: &str) -> Result<()> {
        self.claims(namespace)
            .delete(name, &DeleteParams::default())
            .await
            .with_context(|| format!("Failed to delete PVC {} in namespace {}", name, namespace))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        let result = KubernetesClient::from_kubeconfig(&dir.path().join("config")).await;

        assert!(result.is_err());
        let err_msg = format!("{:#}", result.err().unwrap());
        assert!(err_msg.contains("Failed to read kubeconfig"));
    }
}
