// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Command line of the eksctl dry-run producing the baseline spec.

use crate::constants::node_pool::{DEFAULT_MAX_NODES, DEFAULT_MIN_NODES, DEFAULT_NODES};
use crate::types::request::non_blank;
use crate::types::{ClusterRequest, NetworkingSettings, NodePool};
use std::collections::BTreeMap;

/// Arguments of `eksctl create cluster` without the trailing `--dry-run`
pub fn dry_run_args(request: &ClusterRequest) -> Vec<String> {
    // -v 4 prints a debug line ahead of the YAML
    let mut args = strings(&["create", "cluster", "-v", "3", "--name"]);
    args.push(request.cluster_id.clone());
    args.extend(request.connection.region_args());
    args.push("--full-ecr-access".to_string());

    let networking = &request.networking_settings;
    if networking.private_networking {
        args.push("--node-private-networking".to_string());
        if !networking.private_subnets.is_empty() {
            args.push("--vpc-private-subnets".to_string());
            args.push(networking.private_subnets.join(","));
        }
    }
    if !networking.subnets.is_empty() {
        args.push("--vpc-public-subnets".to_string());
        args.push(networking.subnets.join(","));
    }

    args.extend(security_group_args(networking));
    args.extend(node_pool_args(&request.node_pool));

    if let Some(version) = request.k8s_version() {
        args.push("--version".to_string());
        args.push(version.to_string());
    }
    args
}

pub fn security_group_args(networking: &NetworkingSettings) -> Vec<String> {
    let groups: Vec<&str> = networking
        .security_groups
        .iter()
        .map(|sg| sg.trim())
        .filter(|sg| !sg.is_empty())
        .collect();

    if groups.is_empty() {
        Vec::new()
    } else {
        vec!["--node-security-groups".to_string(), groups.join(",")]
    }
}

pub fn node_pool_args(node_pool: &NodePool) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(machine_type) = non_blank(&node_pool.machine_type) {
        args.extend(["--node-type".to_string(), machine_type.to_string()]);
    }
    if let Some(disk_type) = non_blank(&node_pool.disk_type) {
        args.extend(["--node-volume-type".to_string(), disk_type.to_string()]);
    }
    if let Some(size) = node_pool.disk_size_gb.filter(|size| *size > 0) {
        args.extend(["--node-volume-size".to_string(), size.to_string()]);
    }

    let nodes = node_pool.num_nodes.unwrap_or(DEFAULT_NODES);
    args.extend(["--nodes".to_string(), nodes.to_string()]);

    if node_pool.num_nodes_autoscaling {
        args.push("--asg-access".to_string());
        args.extend([
            "--nodes-min".to_string(),
            node_pool.min_num_nodes.unwrap_or(DEFAULT_MIN_NODES).to_string(),
            "--nodes-max".to_string(),
            node_pool.max_num_nodes.unwrap_or(DEFAULT_MAX_NODES).to_string(),
        ]);
    }

    if !node_pool.labels.is_empty() {
        args.extend(["--node-labels".to_string(), key_values(&node_pool.labels)]);
    }
    if !node_pool.tags.is_empty() {
        args.extend(["--tags".to_string(), key_values(&node_pool.tags)]);
    }
    if node_pool.use_spot_instances {
        args.push("--spot".to_string());
    }
    // the NVIDIA driver is installed as an add-on once the cluster is up
    if node_pool.enable_gpu {
        args.push("--install-nvidia-plugin=false".to_string());
    }

    args.push("--managed".to_string());
    args
}

fn key_values(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
