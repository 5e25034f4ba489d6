// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes metrics server, serving `metrics.k8s.io` through the aggregation layer.

use super::{labels, rule, strings};
use crate::constants::addons::{ADDON_NAMESPACE, METRICS_SERVER_IMAGE, METRICS_SERVER_NAME};
use crate::error::Result;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, ContainerPort, EmptyDirVolumeSource, HTTPGetAction, PodSpec,
    PodTemplateSpec, Probe, SecurityContext, Service, ServiceAccount, ServicePort, ServiceSpec,
    Volume, VolumeMount,
};
use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, RoleBinding, RoleRef, Subject,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use k8s_openapi::kube_aggregator::pkg::apis::apiregistration::v1::{
    APIService, APIServiceSpec, ServiceReference,
};

const AGGREGATED_READER: &str = "system:aggregated-metrics-reader";
const SERVER_ROLE: &str = "system:metrics-server";

pub fn manifests() -> Result<Vec<serde_json::Value>> {
    Ok(vec![
        serde_json::to_value(service_account())?,
        serde_json::to_value(aggregated_reader_role())?,
        serde_json::to_value(server_role())?,
        serde_json::to_value(auth_reader_binding())?,
        serde_json::to_value(cluster_binding(
            "metrics-server:system:auth-delegator",
            "system:auth-delegator",
        ))?,
        serde_json::to_value(cluster_binding(SERVER_ROLE, SERVER_ROLE))?,
        serde_json::to_value(service())?,
        serde_json::to_value(deployment())?,
        serde_json::to_value(api_service())?,
    ])
}

fn meta(name: &str, namespaced: bool) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: namespaced.then(|| ADDON_NAMESPACE.to_string()),
        labels: labels(&[("k8s-app", METRICS_SERVER_NAME)]),
        ..Default::default()
    }
}

fn subject() -> Subject {
    Subject {
        kind: "ServiceAccount".to_string(),
        name: METRICS_SERVER_NAME.to_string(),
        namespace: Some(ADDON_NAMESPACE.to_string()),
        ..Default::default()
    }
}

fn service_account() -> ServiceAccount {
    ServiceAccount {
        metadata: meta(METRICS_SERVER_NAME, true),
        ..Default::default()
    }
}

fn aggregated_reader_role() -> ClusterRole {
    let mut metadata = meta(AGGREGATED_READER, false);
    metadata.labels = labels(&[
        ("k8s-app", METRICS_SERVER_NAME),
        ("rbac.authorization.k8s.io/aggregate-to-admin", "true"),
        ("rbac.authorization.k8s.io/aggregate-to-edit", "true"),
        ("rbac.authorization.k8s.io/aggregate-to-view", "true"),
    ]);

    ClusterRole {
        metadata,
        rules: Some(vec![rule(
            &["metrics.k8s.io"],
            &["pods", "nodes"],
            &["get", "list", "watch"],
        )]),
        ..Default::default()
    }
}

fn server_role() -> ClusterRole {
    ClusterRole {
        metadata: meta(SERVER_ROLE, false),
        rules: Some(vec![
            rule(&[""], &["nodes/metrics"], &["get"]),
            rule(&[""], &["pods", "nodes"], &["get", "list", "watch"]),
        ]),
        ..Default::default()
    }
}

fn auth_reader_binding() -> RoleBinding {
    RoleBinding {
        metadata: meta("metrics-server-auth-reader", true),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "Role".to_string(),
            name: "extension-apiserver-authentication-reader".to_string(),
        },
        subjects: Some(vec![subject()]),
    }
}

fn cluster_binding(name: &str, role: &str) -> ClusterRoleBinding {
    ClusterRoleBinding {
        metadata: meta(name, false),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: role.to_string(),
        },
        subjects: Some(vec![subject()]),
    }
}

fn service() -> Service {
    Service {
        metadata: meta(METRICS_SERVER_NAME, true),
        spec: Some(ServiceSpec {
            selector: labels(&[("k8s-app", METRICS_SERVER_NAME)]),
            ports: Some(vec![ServicePort {
                name: Some("https".to_string()),
                port: 443,
                protocol: Some("TCP".to_string()),
                target_port: Some(IntOrString::String("https".to_string())),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn probe(path: &str) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::String("https".to_string()),
            scheme: Some("HTTPS".to_string()),
            ..Default::default()
        }),
        period_seconds: Some(10),
        failure_threshold: Some(3),
        ..Default::default()
    }
}

fn deployment() -> Deployment {
    let selector = labels(&[("k8s-app", METRICS_SERVER_NAME)]);

    Deployment {
        metadata: meta(METRICS_SERVER_NAME, true),
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: selector.clone(),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: selector,
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(METRICS_SERVER_NAME.to_string()),
                    priority_class_name: Some("system-cluster-critical".to_string()),
                    node_selector: labels(&[("kubernetes.io/os", "linux")]),
                    containers: vec![Container {
                        name: METRICS_SERVER_NAME.to_string(),
                        image: Some(METRICS_SERVER_IMAGE.to_string()),
                        args: Some(strings(&[
                            "--cert-dir=/tmp",
                            "--secure-port=10250",
                            "--kubelet-preferred-address-types=InternalIP,ExternalIP,Hostname",
                            "--kubelet-use-node-status-port",
                            "--metric-resolution=15s",
                        ])),
                        ports: Some(vec![ContainerPort {
                            name: Some("https".to_string()),
                            container_port: 10250,
                            protocol: Some("TCP".to_string()),
                            ..Default::default()
                        }]),
                        readiness_probe: Some(Probe {
                            initial_delay_seconds: Some(20),
                            ..probe("/readyz")
                        }),
                        liveness_probe: Some(probe("/livez")),
                        security_context: Some(SecurityContext {
                            allow_privilege_escalation: Some(false),
                            read_only_root_filesystem: Some(true),
                            run_as_non_root: Some(true),
                            run_as_user: Some(1000),
                            capabilities: Some(Capabilities {
                                drop: Some(strings(&["ALL"])),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        volume_mounts: Some(vec![VolumeMount {
                            name: "tmp-dir".to_string(),
                            mount_path: "/tmp".to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: "tmp-dir".to_string(),
                        empty_dir: Some(EmptyDirVolumeSource::default()),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn api_service() -> APIService {
    APIService {
        metadata: meta("v1beta1.metrics.k8s.io", false),
        spec: Some(APIServiceSpec {
            group: Some("metrics.k8s.io".to_string()),
            version: Some("v1beta1".to_string()),
            group_priority_minimum: 100,
            version_priority: 100,
            insecure_skip_tls_verify: Some(true),
            service: Some(ServiceReference {
                name: Some(METRICS_SERVER_NAME.to_string()),
                namespace: Some(ADDON_NAMESPACE.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
