// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! NVIDIA device plugin, advertising `nvidia.com/gpu` on GPU nodes.

use super::{labels, strings};
use crate::constants::addons::{ADDON_NAMESPACE, GPU_DRIVER_IMAGE, GPU_DRIVER_NAME};
use crate::error::Result;
use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec, DaemonSetUpdateStrategy};
use k8s_openapi::api::core::v1::{
    Capabilities, Container, EnvVar, HostPathVolumeSource, PodSpec, PodTemplateSpec,
    SecurityContext, Toleration, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};

const DEVICE_PLUGIN_DIR: &str = "/var/lib/kubelet/device-plugins";

pub fn manifests() -> Result<Vec<serde_json::Value>> {
    Ok(vec![serde_json::to_value(daemon_set())?])
}

fn daemon_set() -> DaemonSet {
    let selector = labels(&[("name", GPU_DRIVER_NAME)]);

    DaemonSet {
        metadata: ObjectMeta {
            name: Some(format!("{}-daemonset", GPU_DRIVER_NAME)),
            namespace: Some(ADDON_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: selector.clone(),
                ..Default::default()
            },
            update_strategy: Some(DaemonSetUpdateStrategy {
                type_: Some("RollingUpdate".to_string()),
                ..Default::default()
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: selector,
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    priority_class_name: Some("system-node-critical".to_string()),
                    tolerations: Some(vec![Toleration {
                        key: Some("nvidia.com/gpu".to_string()),
                        operator: Some("Exists".to_string()),
                        effect: Some("NoSchedule".to_string()),
                        ..Default::default()
                    }]),
                    containers: vec![Container {
                        name: "nvidia-device-plugin-ctr".to_string(),
                        image: Some(GPU_DRIVER_IMAGE.to_string()),
                        env: Some(vec![EnvVar {
                            name: "FAIL_ON_INIT_ERROR".to_string(),
                            value: Some("false".to_string()),
                            ..Default::default()
                        }]),
                        security_context: Some(SecurityContext {
                            allow_privilege_escalation: Some(false),
                            capabilities: Some(Capabilities {
                                drop: Some(strings(&["ALL"])),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }),
                        volume_mounts: Some(vec![VolumeMount {
                            name: "device-plugin".to_string(),
                            mount_path: DEVICE_PLUGIN_DIR.to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    volumes: Some(vec![Volume {
                        name: "device-plugin".to_string(),
                        host_path: Some(HostPathVolumeSource {
                            path: DEVICE_PLUGIN_DIR.to_string(),
                            ..Default::default()
                        }),
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
