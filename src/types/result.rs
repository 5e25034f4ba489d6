// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! What a successful start hands back to the calling platform.

use crate::error::ProvisionerError;
use crate::network::NetworkAccessTask;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overrides telling the platform where and how to use the cluster
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Overrides {
    pub container: ContainerOverrides,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverrides {
    pub execution_configs_generic_overrides: ExecutionConfigOverrides,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfigOverrides {
    pub kube_ctl_context: String,
    /// The context is not merged into the user's main kubeconfig
    pub kube_config_path: PathBuf,
    pub base_image: Option<String>,
    #[serde(rename = "repositoryURL")]
    pub repository_url: Option<String>,
}

/// Data kept by the platform between start and stop
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeData {
    pub kube_config_path: PathBuf,
    /// First element of `eksctl get cluster -o json`
    pub cluster: serde_json::Value,
}

/// Outcome of a successful start
#[derive(Debug)]
pub struct ClusterResult {
    pub overrides: Overrides,
    pub runtime_data: RuntimeData,
    /// Add-ons that could not be installed; the cluster itself is up
    pub addon_errors: Vec<ProvisionerError>,
    /// Background security group reconciliation, still running or finished
    pub network_access: Option<NetworkAccessTask>,
}

impl ClusterResult {
    /// The `[overrides, runtimeData]` pair returned to the platform
    pub fn to_platform_json(&self) -> serde_json::Result<serde_json::Value> {
        Ok(serde_json::Value::Array(vec![
            serde_json::to_value(&self.overrides)?,
            serde_json::to_value(&self.runtime_data)?,
        ]))
    }
}
