// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! In-cluster add-ons installed once the cluster is reachable.

pub mod autoscaler;
pub mod gpu_driver;
pub mod installer;
pub mod metrics_server;

use crate::error::Result;
use async_trait::async_trait;
use k8s_openapi::api::rbac::v1::PolicyRule;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub use installer::KubeAddOnInstaller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddOn {
    Autoscaler,
    GpuDriver,
    MetricsServer,
}

impl fmt::Display for AddOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddOn::Autoscaler => "cluster autoscaler",
            AddOn::GpuDriver => "GPU driver",
            AddOn::MetricsServer => "metrics server",
        })
    }
}

impl AddOn {
    /// The objects making up this add-on, in apply order
    pub fn manifests(&self, cluster_id: &str) -> Result<Vec<serde_json::Value>> {
        match self {
            AddOn::Autoscaler => autoscaler::manifests(cluster_id),
            AddOn::GpuDriver => gpu_driver::manifests(),
            AddOn::MetricsServer => metrics_server::manifests(),
        }
    }
}

/// The cluster an add-on is installed into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOnTarget {
    pub cluster_id: String,
    pub kubeconfig_path: PathBuf,
}

/// Installs add-ons into a running cluster.
///
/// `ensure` converges: running it for an add-on that is already present
/// leaves the cluster unchanged.
#[async_trait]
pub trait AddOnInstaller: Send + Sync {
    async fn ensure(&self, addon: AddOn, target: &AddOnTarget) -> Result<()>;
}

pub(crate) fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub(crate) fn labels(pairs: &[(&str, &str)]) -> Option<BTreeMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

pub(crate) fn rule(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> PolicyRule {
    PolicyRule {
        api_groups: Some(strings(api_groups)),
        resources: Some(strings(resources)),
        verbs: strings(verbs),
        ..Default::default()
    }
}
