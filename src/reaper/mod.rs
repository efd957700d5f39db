/// Reclaiming of unmounted development volume claims
pub mod selector;

use std::collections::HashSet;
use std::fmt;

use anyhow::Result;
use k8s_openapi::api::core::v1::Pod;
use tracing::{error, info};

use crate::k8s::ClusterApi;
use selector::VolumeSelector;

const SEPARATOR: &str = "-----------------------------------------------";

/// What happened in a single namespace
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NamespaceOutcome {
    pub deleted: Vec<String>,
    pub in_use: Vec<String>,
    pub failed: Vec<String>,
}

/// Totals for a whole run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub namespaces_checked: usize,
    pub namespaces_skipped: usize,
    pub deleted: usize,
    pub in_use: usize,
    pub failed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Checked {} namespaces ({} skipped): {} PVCs deleted, {} in use, {} failed to delete",
            self.namespaces_checked, self.namespaces_skipped, self.deleted, self.in_use, self.failed
        )
    }
}

impl RunSummary {
    fn record(&mut self, outcome: &NamespaceOutcome) {
        self.namespaces_checked += 1;
        self.deleted += outcome.deleted.len();
        self.in_use += outcome.in_use.len();
        self.failed += outcome.failed.len();
    }
}

/// Claim names referenced by any pod volume in the namespace
pub async fn mounted_claims<C: ClusterApi + ?Sized>(
    cluster: &C,
    namespace: &str,
) -> Result<HashSet<String>> {
    let pods = cluster.list_pods(namespace).await?;
    Ok(claims_mounted_by(&pods))
}

fn claims_mounted_by(pods: &[Pod]) -> HashSet<String> {
    pods.iter()
        .filter_map(|pod| pod.spec.as_ref()?.volumes.as_ref())
        .flatten()
        .filter_map(|volume| volume.persistent_volume_claim.as_ref())
        .map(|source| source.claim_name.clone())
        .collect()
}

/// Names of the claims the selector marks as development volumes, in API order
pub async fn dev_claims<C, S>(cluster: &C, selector: &S, namespace: &str) -> Result<Vec<String>>
where
    C: ClusterApi + ?Sized,
    S: VolumeSelector + ?Sized,
{
    let claims = cluster
        .list_claims(namespace, &selector.list_params())
        .await?;

    Ok(claims
        .iter()
        .filter(|claim| selector.selects(claim))
        .filter_map(|claim| claim.metadata.name.clone())
        .collect())
}

/// Deletes development claims that no pod mounts
pub struct Reaper<'a, C: ?Sized, S: ?Sized> {
    cluster: &'a C,
    selector: &'a S,
}

impl<'a, C, S> Reaper<'a, C, S>
where
    C: ClusterApi + ?Sized,
    S: VolumeSelector + ?Sized,
{
    pub fn new(cluster: &'a C, selector: &'a S) -> Self {
        Self { cluster, selector }
    }

    /// Sweep every namespace in order.
    ///
    /// Errors in one namespace are logged and never stop the sweep.
    pub async fn run<I, N>(&self, namespaces: I) -> RunSummary
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut summary = RunSummary::default();

        for namespace in namespaces {
            let namespace = namespace.as_ref();
            info!("Checking namespace '{}'", namespace);

            match self.reap_namespace(namespace).await {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!("Skipping ns {:?} because {:#}", namespace, e);
                    summary.namespaces_skipped += 1;
                }
            }

            info!("{}", SEPARATOR);
        }

        summary
    }

    /// Delete the unmounted development claims of one namespace.
    ///
    /// Fails only when listing pods or claims fails. Delete failures are
    /// recorded in the outcome and the remaining claims are still tried.
    /// The mounted set is not re-checked before each delete, so a pod
    /// scheduled mid-sweep can lose its claim.
    pub async fn reap_namespace(&self, namespace: &str) -> Result<NamespaceOutcome> {
        let mounted = mounted_claims(self.cluster, namespace)
            .await
            .map_err(|e| e.context("there was an error checking PVCs for namespace"))?;

        let candidates = dev_claims(self.cluster, self.selector, namespace)
            .await
            .map_err(|e| e.context("there was an error checking dev PVCs for namespace"))?;

        let mut outcome = NamespaceOutcome::default();

        if candidates.is_empty() {
            info!("Skipping ns {:?} because there are no dev PVCs", namespace);
            return Ok(outcome);
        }

        for claim in candidates {
            if mounted.contains(&claim) {
                info!(
                    "Skipping PVC {:?} in namespace {:?} because it is mounted in a pod",
                    claim, namespace
                );
                outcome.in_use.push(claim);
                continue;
            }

            match self.cluster.delete_claim(namespace, &claim).await {
                Ok(()) => {
                    info!("Deleted PVC {:?} in namespace {:?}", claim, namespace);
                    outcome.deleted.push(claim);
                }
                Err(e) => {
                    error!(
                        "Error deleting PVC {:?} in namespace {:?}: {:#}",
                        claim, namespace, e
                    );
                    outcome.failed.push(claim);
                }
            }
        }

        Ok(outcome)
    }
}
