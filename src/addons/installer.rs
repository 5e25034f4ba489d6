// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use super::{AddOn, AddOnInstaller, AddOnTarget};
use crate::error::Result;
use crate::kubernetes::{apply_manifest, client_from_kubeconfig_file};
use async_trait::async_trait;
use kube::Client;
use tracing::{info, instrument};

/// [`AddOnInstaller`] applying the add-on manifests with server-side apply
/// through the cluster's generated kubeconfig.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeAddOnInstaller;

#[async_trait]
impl AddOnInstaller for KubeAddOnInstaller {
    async fn ensure(&self, addon: AddOn, target: &AddOnTarget) -> Result<()> {
        let client = client_from_kubeconfig_file(&target.kubeconfig_path).await?;
        apply_addon(&client, addon, &target.cluster_id).await
    }
}

#[instrument(skip(client), fields(addon = %addon))]
pub async fn apply_addon(client: &Client, addon: AddOn, cluster_id: &str) -> Result<()> {
    let manifests = addon.manifests(cluster_id)?;
    for manifest in &manifests {
        apply_manifest(client, manifest).await?;
    }
    info!("Applied {} objects for {}", manifests.len(), addon);
    Ok(())
}
