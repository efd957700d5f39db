/// Scoped kubeconfig bootstrap
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::{debug, info};

use crate::utils::command::CommandBuilder;

/// A temporary directory holding the kubeconfig for this run.
///
/// The directory and everything the bootstrap command wrote into it are
/// removed when the workspace is dropped.
pub struct KubeconfigWorkspace {
    dir: TempDir,
    path: PathBuf,
}

impl KubeconfigWorkspace {
    /// Create an empty workspace under the system temp directory
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("dev-volume-reaper-")
            .tempdir()
            .context("Failed to create a temporary directory")?;
        let path = dir.path().join(".kube").join("config");
        let workspace = Self { dir, path };

        debug!("Kubeconfig workspace: {}", workspace.root().display());

        Ok(workspace)
    }

    /// Location the bootstrap command writes the kubeconfig to
    pub fn kubeconfig_path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Run the bootstrap command with KUBECONFIG pointing into the workspace.
    ///
    /// The command's combined output is logged as-is and returned.
    pub async fn bootstrap(&self, command_line: &str) -> Result<String> {
        info!("Creating kubeconfig with '{}'", command_line);

        let output = CommandBuilder::shell_interleaved(command_line)
            .kubeconfig(&self.path)
            .context("Failed to run the kubeconfig command")
            .run()
            .await
            .context("There was an error creating the kubeconfig")?;

        info!("{}", output);

        if !self.path.exists() {
            anyhow::bail!(
                "Kubeconfig command succeeded but wrote nothing to {}",
                self.path.display()
            );
        }

        Ok(output)
    }
}
