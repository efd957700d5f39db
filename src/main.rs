/// Dev Volume Reaper
///
/// Deletes the persistent volume claims created for development containers
/// once no pod in their namespace mounts them anymore. Meant to be run
/// periodically, e.g. from a CronJob.
mod config;
mod k8s;
mod okteto;
mod reaper;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ReaperConfig, TOKEN_ENV, URL_ENV};
use crate::k8s::{KubeconfigWorkspace, KubernetesClient};
use crate::okteto::OktetoClient;
use crate::reaper::Reaper;

#[derive(Parser)]
#[command(name = "dev-volume-reaper")]
#[command(about = "Delete development volumes no pod mounts anymore", long_about = None)]
struct Cli {
    /// Control-plane access token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,

    /// Control-plane URL
    #[arg(long, env = URL_ENV)]
    url: Option<String>,

    /// Label (key=value, value may be empty) marking development volume claims
    #[arg(long, value_name = "KEY=VALUE")]
    dev_label: Option<String>,

    /// Shell command that writes the kubeconfig to $KUBECONFIG
    #[arg(long)]
    kubeconfig_command: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dev_volume_reaper={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

/// One full pass over every namespace
async fn run(cli: Cli) -> Result<()> {
    let config = ReaperConfig::resolve(
        cli.token,
        cli.url,
        cli.dev_label.as_deref(),
        cli.kubeconfig_command,
    )?;

    let control_plane = OktetoClient::new(&config.api_host(), &config.token)?;
    let namespaces = control_plane
        .list_namespaces()
        .await
        .context("There was an error requesting the namespaces")?;

    info!("Found {} namespaces", namespaces.len());

    // Dropping the workspace removes the kubeconfig, also on early return
    let workspace = KubeconfigWorkspace::create()?;
    workspace.bootstrap(&config.kubeconfig_command).await?;

    let cluster = KubernetesClient::from_kubeconfig(workspace.kubeconfig_path())
        .await
        .context("There was an error creating the Kubernetes client")?;

    info!("Selecting dev PVCs with label {}", config.dev_label);

    let summary = Reaper::new(&cluster, &config.dev_label)
        .run(namespaces.iter().map(|ns| ns.name.as_str()))
        .await;

    info!("{}", summary);

    Ok(())
}
