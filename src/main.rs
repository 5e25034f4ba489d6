// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eks_cluster::addons::KubeAddOnInstaller;
use eks_cluster::command::ProcessRunner;
use eks_cluster::config::Config;
use eks_cluster::lifecycle::{ClusterController, Dependencies};
use eks_cluster::network::ImdsClient;
use eks_cluster::types::{ClusterRequest, RuntimeData};

#[derive(Parser)]
#[command(name = "eks-cluster", about = "Create and delete EKS clusters with eksctl")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the cluster and print the overrides and runtime data as JSON
    Start {
        /// Cluster request (JSON)
        #[arg(long, env = "EKS_CLUSTER_REQUEST")]
        request: PathBuf,
    },
    /// Delete the cluster
    Stop {
        /// Cluster request (JSON)
        #[arg(long, env = "EKS_CLUSTER_REQUEST")]
        request: PathBuf,
        /// Runtime data printed by `start`
        #[arg(long)]
        runtime: Option<PathBuf>,
    },
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the result, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    info!("Working directory: {}", config.work_dir.display());

    let deps = Dependencies {
        runner: Arc::new(ProcessRunner),
        addons: Arc::new(KubeAddOnInstaller),
        metadata: Arc::new(ImdsClient::new(config.imds_endpoint.clone())?),
    };

    match cli.command {
        Command::Start { request } => {
            let request: ClusterRequest = read_json(&request)?;
            info!("Starting cluster {}", request.cluster_id);

            let mut controller = ClusterController::new(request, config, deps);
            let result = controller.start().await?;

            for error in &result.addon_errors {
                warn!("{}", error);
            }
            if let Some(task) = &result.network_access {
                if !task.is_finished() {
                    warn!(
                        "Network access for {} still being reconciled, abandoning it on exit",
                        task.cluster_id()
                    );
                }
            }

            println!("{}", serde_json::to_string_pretty(&result.to_platform_json()?)?);
        }
        Command::Stop { request, runtime } => {
            let request: ClusterRequest = read_json(&request)?;
            let runtime = runtime
                .as_deref()
                .map(read_json::<RuntimeData>)
                .transpose()?;
            info!("Stopping cluster {}", request.cluster_id);

            ClusterController::new(request, config, deps)
                .stop(runtime.as_ref())
                .await?;
        }
    }

    Ok(())
}
