// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client creation for a freshly provisioned cluster

use crate::error::{ProvisionerError, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use std::path::Path;
use tracing::{info, instrument};

/// Create a Kubernetes client from the kubeconfig file eksctl generated
#[instrument(fields(path = %path.display()))]
pub async fn client_from_kubeconfig_file(path: &Path) -> Result<Client> {
    info!("Creating Kubernetes client from kubeconfig {}", path.display());

    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
        ProvisionerError::Kubeconfig(format!(
            "Failed to read kubeconfig {}: {}",
            path.display(),
            e
        ))
    })?;

    let client_config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| {
                ProvisionerError::Kubeconfig(format!("Failed to create config: {}", e))
            })?;

    Client::try_from(client_config)
        .map_err(|e| ProvisionerError::Kubeconfig(format!("Failed to create client: {}", e)))
}
