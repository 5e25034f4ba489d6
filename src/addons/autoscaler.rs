// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster autoscaler for the AWS cloud provider.
//!
//! Node groups are discovered through the auto scaling group tags eksctl
//! sets when a node group is created with `--asg-access`.

use super::{labels, rule, strings};
use crate::constants::addons::{ADDON_NAMESPACE, AUTOSCALER_IMAGE, AUTOSCALER_NAME};
use crate::error::Result;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, PodSecurityContext, PodSpec, PodTemplateSpec,
    ResourceRequirements, SecurityContext, ServiceAccount,
};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, RoleRef, Subject};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// Tag selector matching the auto scaling groups of `cluster_id`
pub fn auto_discovery_tags(cluster_id: &str) -> String {
    format!(
        "asg:tag=k8s.io/cluster-autoscaler/enabled,k8s.io/cluster-autoscaler/{}",
        cluster_id
    )
}

pub fn manifests(cluster_id: &str) -> Result<Vec<serde_json::Value>> {
    Ok(vec![
        serde_json::to_value(service_account())?,
        serde_json::to_value(cluster_role())?,
        serde_json::to_value(cluster_role_binding())?,
        serde_json::to_value(deployment(cluster_id))?,
    ])
}

fn metadata() -> ObjectMeta {
    ObjectMeta {
        name: Some(AUTOSCALER_NAME.to_string()),
        namespace: Some(ADDON_NAMESPACE.to_string()),
        labels: labels(&[("k8s-app", AUTOSCALER_NAME)]),
        ..Default::default()
    }
}

fn service_account() -> ServiceAccount {
    ServiceAccount {
        metadata: metadata(),
        ..Default::default()
    }
}

fn cluster_role() -> ClusterRole {
    ClusterRole {
        metadata: ObjectMeta {
            namespace: None,
            ..metadata()
        },
        rules: Some(vec![
            rule(&[""], &["events", "endpoints"], &["create", "patch"]),
            rule(&[""], &["pods/eviction"], &["create"]),
            rule(&[""], &["pods/status"], &["update"]),
            rule(&[""], &["nodes"], &["watch", "list", "get", "update"]),
            rule(
                &[""],
                &[
                    "namespaces",
                    "pods",
                    "services",
                    "replicationcontrollers",
                    "persistentvolumeclaims",
                    "persistentvolumes",
                ],
                &["watch", "list", "get"],
            ),
            rule(&[""], &["configmaps"], &["create", "list", "watch", "get", "update"]),
            rule(
                &["apps"],
                &["statefulsets", "replicasets", "daemonsets"],
                &["watch", "list", "get"],
            ),
            rule(&["policy"], &["poddisruptionbudgets"], &["watch", "list"]),
            rule(
                &["storage.k8s.io"],
                &["storageclasses", "csinodes", "csidrivers", "csistoragecapacities"],
                &["watch", "list", "get"],
            ),
            rule(&["batch"], &["jobs", "cronjobs"], &["watch", "list", "get"]),
            rule(&["coordination.k8s.io"], &["leases"], &["create", "get", "update"]),
        ]),
        ..Default::default()
    }
}

fn cluster_role_binding() -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: ObjectMeta {
            namespace: None,
            ..metadata()
        },
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: AUTOSCALER_NAME.to_string(),
        },
        subjects: Some(vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: AUTOSCALER_NAME.to_string(),
            namespace: Some(ADDON_NAMESPACE.to_string()),
            ..Default::default()
        }]),
    }
}

fn deployment(cluster_id: &str) -> Deployment {
    let selector = labels(&[("app", AUTOSCALER_NAME)]);

    let mut command = strings(&[
        "./cluster-autoscaler",
        "--v=4",
        "--stderrthreshold=info",
        "--cloud-provider=aws",
        "--skip-nodes-with-local-storage=false",
        "--expander=least-waste",
        "--balance-similar-node-groups",
        "--skip-nodes-with-system-pods=false",
    ]);
    command.push(format!(
        "--node-group-auto-discovery={}",
        auto_discovery_tags(cluster_id)
    ));

    let resources = BTreeMap::from([
        ("cpu".to_string(), Quantity("100m".to_string())),
        ("memory".to_string(), Quantity("600Mi".to_string())),
    ]);

    Deployment {
        metadata: metadata(),
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector {
                match_labels: selector.clone(),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: selector,
                    annotations: labels(&[(
                        "cluster-autoscaler.kubernetes.io/safe-to-evict",
                        "false",
                    )]),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(AUTOSCALER_NAME.to_string()),
                    priority_class_name: Some("system-cluster-critical".to_string()),
                    security_context: Some(PodSecurityContext {
                        run_as_non_root: Some(true),
                        run_as_user: Some(65534),
                        fs_group: Some(65534),
                        ..Default::default()
                    }),
                    containers: vec![Container {
                        name: AUTOSCALER_NAME.to_string(),
                        image: Some(AUTOSCALER_IMAGE.to_string()),
                        command: Some(command),
                        resources: Some(ResourceRequirements {
                            limits: Some(resources.clone()),
                            requests: Some(resources),
                            ..Default::default()
                        }),
                        security_context: Some(SecurityContext {
                            allow_privilege_escalation: Some(false),
                            read_only_root_filesystem: Some(true),
                            capabilities: Some(Capabilities {
                                drop: Some(strings(&["ALL"])),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}
