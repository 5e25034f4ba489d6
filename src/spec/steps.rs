// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Overrides applied to the dry-run spec for settings eksctl has no flag for.

use crate::constants::spec_keys::{
    ADDITIONAL_ENDPOINT_SERVICES, AUTOSCALING_SERVICE, CLUSTER_ENDPOINTS, ENABLED,
    PRE_BOOTSTRAP_COMMANDS, PRIVATE_CLUSTER, SECURITY_GROUP, SHARED_NODE_SECURITY_GROUP,
    SKIP_ENDPOINT_CREATION, VPC,
};
use crate::spec::document::ClusterSpecDocument;
use crate::types::{ClusterMode, ClusterRequest};
use serde_yaml::{Sequence, Value};
use tracing::info;

/// One named transformation of the spec document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecStep {
    /// Enable `privateCluster` and let eksctl compute the endpoint CIDRs
    PrivateCluster {
        skip_endpoint_creation: bool,
        autoscaling: bool,
    },
    /// Security group attached to the control plane
    ControlPlaneSecurityGroup(String),
    /// Security group shared by all nodes and by the VPC endpoints
    SharedNodeSecurityGroup(String),
    /// Shell lines run on every managed node before bootstrap
    PreBootstrapCommands(Vec<String>),
}

impl SpecStep {
    pub fn name(&self) -> &'static str {
        match self {
            SpecStep::PrivateCluster { .. } => "private-cluster",
            SpecStep::ControlPlaneSecurityGroup(_) => "control-plane-security-group",
            SpecStep::SharedNodeSecurityGroup(_) => "shared-node-security-group",
            SpecStep::PreBootstrapCommands(_) => "pre-bootstrap-commands",
        }
    }

    pub fn apply(&self, mut doc: ClusterSpecDocument) -> ClusterSpecDocument {
        match self {
            SpecStep::PrivateCluster {
                skip_endpoint_creation,
                autoscaling,
            } => {
                let private_cluster = doc.mapping_mut(PRIVATE_CLUSTER);
                private_cluster.insert(ENABLED.into(), Value::Bool(true));
                private_cluster.insert(
                    SKIP_ENDPOINT_CREATION.into(),
                    Value::Bool(*skip_endpoint_creation),
                );
                if !skip_endpoint_creation && *autoscaling {
                    let services = private_cluster
                        .entry(ADDITIONAL_ENDPOINT_SERVICES.into())
                        .or_insert_with(|| Value::Sequence(Sequence::new()));
                    push_unique(services, AUTOSCALING_SERVICE);
                }
                doc.mapping_mut(VPC).remove(CLUSTER_ENDPOINTS);
            }
            SpecStep::ControlPlaneSecurityGroup(group_id) => {
                doc.mapping_mut(VPC)
                    .insert(SECURITY_GROUP.into(), Value::from(group_id.as_str()));
            }
            SpecStep::SharedNodeSecurityGroup(group_id) => {
                doc.mapping_mut(VPC).insert(
                    SHARED_NODE_SECURITY_GROUP.into(),
                    Value::from(group_id.as_str()),
                );
            }
            SpecStep::PreBootstrapCommands(commands) => {
                for group in doc.managed_node_groups_mut().into_iter().flatten() {
                    let Value::Mapping(group) = group else {
                        continue;
                    };
                    let existing = group
                        .entry(PRE_BOOTSTRAP_COMMANDS.into())
                        .or_insert(Value::Null);
                    if !existing.is_sequence() {
                        *existing = Value::Sequence(Sequence::new());
                    }
                    if let Value::Sequence(list) = existing {
                        list.extend(commands.iter().map(|c| Value::from(c.as_str())));
                    }
                }
            }
        }
        doc
    }
}

fn push_unique(services: &mut Value, service: &str) {
    if !services.is_sequence() {
        *services = Value::Sequence(Sequence::new());
    }
    if let Value::Sequence(list) = services {
        if !list.iter().any(|s| s.as_str() == Some(service)) {
            list.push(Value::from(service));
        }
    }
}

/// Where the control-plane-facing security group comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityGroupPlacement {
    ControlPlane(String),
    SharedNode(String),
    /// Private cluster without a caller-provided group: the caller has to be
    /// let into the groups eksctl creates once they exist
    AttachCaller,
    Unchanged,
}

impl SecurityGroupPlacement {
    pub fn for_request(request: &ClusterRequest) -> Self {
        let networking = &request.networking_settings;
        if let Some(group_id) = networking.control_plane_security_group() {
            SecurityGroupPlacement::ControlPlane(group_id.to_string())
        } else if let Some(group_id) = networking.shared_security_group() {
            SecurityGroupPlacement::SharedNode(group_id.to_string())
        } else if request.private_cluster {
            SecurityGroupPlacement::AttachCaller
        } else {
            SecurityGroupPlacement::Unchanged
        }
    }
}

/// Ordered overrides for one request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverridePlan {
    pub steps: Vec<SpecStep>,
    pub attach_caller: bool,
}

impl OverridePlan {
    /// Overrides for a simple-mode request; advanced specs are used as given
    pub fn for_request(request: &ClusterRequest) -> Self {
        let ClusterMode::Simple(node_pool) = request.mode() else {
            return Self::default();
        };

        let mut steps = Vec::new();
        if request.private_cluster {
            steps.push(SpecStep::PrivateCluster {
                skip_endpoint_creation: request.skip_endpoint_creation,
                autoscaling: request.has_autoscaling(),
            });
        }

        let placement = SecurityGroupPlacement::for_request(request);
        match &placement {
            SecurityGroupPlacement::ControlPlane(group_id) => {
                steps.push(SpecStep::ControlPlaneSecurityGroup(group_id.clone()))
            }
            SecurityGroupPlacement::SharedNode(group_id) => {
                steps.push(SpecStep::SharedNodeSecurityGroup(group_id.clone()))
            }
            SecurityGroupPlacement::AttachCaller | SecurityGroupPlacement::Unchanged => {}
        }

        if let Some(commands) = node_pool.pre_bootstrap_commands() {
            steps.push(SpecStep::PreBootstrapCommands(commands));
        }

        Self {
            steps,
            attach_caller: placement == SecurityGroupPlacement::AttachCaller,
        }
    }

    pub fn apply(&self, doc: ClusterSpecDocument) -> ClusterSpecDocument {
        self.steps.iter().fold(doc, |doc, step| {
            info!("Applying spec override {}", step.name());
            step.apply(doc)
        })
    }
}
