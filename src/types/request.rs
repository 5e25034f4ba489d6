// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster request as sent by the calling platform.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Immutable description of the cluster to create.
///
/// The `advanced` flag decides which fields are authoritative: in advanced mode
/// only `advanced_yaml`, `cluster_auto_scaling` and `advanced_gpu` are read for
/// the node groups, everything under `node_pool` is ignored, and vice versa.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterRequest {
    pub cluster_id: String,
    pub cluster_name: String,
    pub connection: ConnectionInfo,
    pub advanced: bool,
    pub advanced_yaml: Option<String>,
    pub cluster_auto_scaling: bool,
    #[serde(rename = "advancedGPU")]
    pub advanced_gpu: bool,
    pub networking_settings: NetworkingSettings,
    pub node_pool: NodePool,
    pub k8s_version: Option<String>,
    pub private_cluster: bool,
    pub skip_endpoint_creation: bool,
    pub make_private_only: bool,
    #[serde(rename = "injectedSG")]
    pub injected_sg: Option<String>,
    pub install_metrics_server: bool,
}

/// Which part of the request describes the cluster spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode<'a> {
    /// Spec derived from an eksctl dry-run plus overrides
    Simple(&'a NodePool),
    /// Spec supplied verbatim by the caller
    Advanced { yaml: &'a str },
}

impl ClusterRequest {
    pub fn mode(&self) -> ClusterMode<'_> {
        if self.advanced {
            ClusterMode::Advanced {
                yaml: self.advanced_yaml.as_deref().unwrap_or_default(),
            }
        } else {
            ClusterMode::Simple(&self.node_pool)
        }
    }

    pub fn has_autoscaling(&self) -> bool {
        match self.mode() {
            ClusterMode::Simple(node_pool) => node_pool.num_nodes_autoscaling,
            ClusterMode::Advanced { .. } => self.cluster_auto_scaling,
        }
    }

    pub fn has_gpu(&self) -> bool {
        match self.mode() {
            ClusterMode::Simple(node_pool) => node_pool.enable_gpu,
            ClusterMode::Advanced { .. } => self.advanced_gpu,
        }
    }

    /// Security group of the calling VM, if one was configured
    pub fn injected_security_group(&self) -> Option<&str> {
        non_blank(&self.injected_sg)
    }

    pub fn k8s_version(&self) -> Option<&str> {
        non_blank(&self.k8s_version)
    }
}

/// Cloud connection settings shared by every CLI invocation
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionInfo {
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
}

impl ConnectionInfo {
    /// `--region <region>` when a region is set
    pub fn region_args(&self) -> Vec<String> {
        match non_blank(&self.region) {
            Some(region) => vec!["--region".to_string(), region.to_string()],
            None => Vec::new(),
        }
    }

    /// Environment variables carrying the credentials to child processes
    pub fn env(&self) -> Vec<(String, String)> {
        [
            ("AWS_ACCESS_KEY_ID", &self.access_key),
            ("AWS_SECRET_ACCESS_KEY", &self.secret_key),
            ("AWS_SESSION_TOKEN", &self.session_token),
            ("AWS_DEFAULT_REGION", &self.region),
        ]
        .into_iter()
        .filter_map(|(name, value)| non_blank(value).map(|v| (name.to_string(), v.to_string())))
        .collect()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkingSettings {
    /// Public subnets
    pub subnets: Vec<String>,
    pub private_networking: bool,
    pub private_subnets: Vec<String>,
    pub security_groups: Vec<String>,
    #[serde(rename = "controlPlaneSG")]
    pub control_plane_sg: Option<String>,
    #[serde(rename = "sharedSG")]
    pub shared_sg: Option<String>,
}

impl NetworkingSettings {
    pub fn control_plane_security_group(&self) -> Option<&str> {
        non_blank(&self.control_plane_sg)
    }

    pub fn shared_security_group(&self) -> Option<&str> {
        non_blank(&self.shared_sg)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePool {
    pub machine_type: Option<String>,
    pub disk_type: Option<String>,
    pub disk_size_gb: Option<u32>,
    pub num_nodes: Option<u32>,
    pub num_nodes_autoscaling: bool,
    pub min_num_nodes: Option<u32>,
    pub max_num_nodes: Option<u32>,
    #[serde(rename = "enableGPU")]
    pub enable_gpu: bool,
    pub use_spot_instances: bool,
    pub labels: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub add_pre_bootstrap_commands: bool,
    pub pre_bootstrap_commands: Option<String>,
}

impl NodePool {
    /// Non-blank pre-bootstrap command lines, in order, when enabled
    pub fn pre_bootstrap_commands(&self) -> Option<Vec<String>> {
        if !self.add_pre_bootstrap_commands {
            return None;
        }
        let commands: Vec<String> = self
            .pre_bootstrap_commands
            .as_deref()?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        (!commands.is_empty()).then_some(commands)
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_platform_settings() {
        let request: ClusterRequest = serde_json::from_value(serde_json::json!({
            "clusterId": "demo1",
            "clusterName": "Demo",
            "connection": {"region": "eu-west-1"},
            "networkingSettings": {
                "privateNetworking": true,
                "subnets": ["subnet-a"],
                "controlPlaneSG": " sg-cp "
            },
            "nodePool": {"numNodes": 2, "enableGPU": true},
            "injectedSG": "  ",
        }))
        .unwrap();

        assert_eq!(request.cluster_id, "demo1");
        assert!(request.networking_settings.private_networking);
        assert_eq!(
            request.networking_settings.control_plane_security_group(),
            Some("sg-cp")
        );
        assert_eq!(request.injected_security_group(), None);
        assert!(request.has_gpu());
        assert!(!request.has_autoscaling());
    }

    #[test]
    fn test_mode_decides_authoritative_flags() {
        let mut request = ClusterRequest {
            cluster_auto_scaling: true,
            node_pool: NodePool {
                enable_gpu: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(request.mode(), ClusterMode::Simple(_)));
        assert!(!request.has_autoscaling());
        assert!(request.has_gpu());

        request.advanced = true;
        request.advanced_yaml = Some("metadata: {}".to_string());
        assert_eq!(
            request.mode(),
            ClusterMode::Advanced {
                yaml: "metadata: {}"
            }
        );
        assert!(request.has_autoscaling());
        assert!(!request.has_gpu());
    }

    #[test]
    fn test_region_args_and_env() {
        let connection = ConnectionInfo {
            region: Some("us-east-1".to_string()),
            access_key: Some("AKIA".to_string()),
            secret_key: Some("secret".to_string()),
            session_token: None,
        };

        assert_eq!(connection.region_args(), vec!["--region", "us-east-1"]);
        assert_eq!(
            connection.env(),
            vec![
                ("AWS_ACCESS_KEY_ID".to_string(), "AKIA".to_string()),
                ("AWS_SECRET_ACCESS_KEY".to_string(), "secret".to_string()),
                ("AWS_DEFAULT_REGION".to_string(), "us-east-1".to_string()),
            ]
        );
        assert!(ConnectionInfo::default().region_args().is_empty());
    }

    #[test]
    fn test_pre_bootstrap_commands_drop_blank_lines() {
        let node_pool = NodePool {
            add_pre_bootstrap_commands: true,
            pre_bootstrap_commands: Some("echo one\n\n   \necho two\n\t\necho three".to_string()),
            ..Default::default()
        };

        assert_eq!(
            node_pool.pre_bootstrap_commands(),
            Some(vec![
                "echo one".to_string(),
                "echo two".to_string(),
                "echo three".to_string()
            ])
        );
    }

    #[test]
    fn test_pre_bootstrap_commands_require_flag() {
        let node_pool = NodePool {
            add_pre_bootstrap_commands: false,
            pre_bootstrap_commands: Some("echo one".to_string()),
            ..Default::default()
        };
        assert_eq!(node_pool.pre_bootstrap_commands(), None);

        let blank = NodePool {
            add_pre_bootstrap_commands: true,
            pre_bootstrap_commands: Some("  \n ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.pre_bootstrap_commands(), None);
    }

    #[test]
    fn test_pre_bootstrap_commands_keep_indentation() {
        let node_pool = NodePool {
            add_pre_bootstrap_commands: true,
            pre_bootstrap_commands: Some("  echo a\n\n  echo b  ".to_string()),
            ..Default::default()
        };

        assert_eq!(
            node_pool.pre_bootstrap_commands(),
            Some(vec!["  echo a".to_string(), "  echo b  ".to_string()])
        );
    }
}
