// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Name used as field manager for server-side apply
pub const FIELD_MANAGER: &str = "eks-cluster";

/// Files written next to each other in the working directory
pub mod files {
    /// Kubeconfig produced by `eksctl create cluster --kubeconfig`
    pub const KUBECONFIG: &str = "kube_config";
    /// Suffix appended to the cluster id for the spec document
    pub const SPEC_SUFFIX: &str = "_config.yaml";
}

/// CloudFormation logical ids of the security groups eksctl creates
pub mod stack {
    pub const CONTROL_PLANE_SECURITY_GROUP: &str = "ControlPlaneSecurityGroup";
    pub const SHARED_NODE_SECURITY_GROUP: &str = "ClusterSharedNodeSecurityGroup";

    pub const LOGICAL_SECURITY_GROUPS: [&str; 2] =
        [CONTROL_PLANE_SECURITY_GROUP, SHARED_NODE_SECURITY_GROUP];
}

/// Stack discovery polling configuration
pub mod polling {
    /// Interval between two `describe-stacks` attempts
    pub const STACK_POLL_INTERVAL_SECS: u64 = 5;
    /// Attempts before giving up, about 30 minutes at the default interval
    pub const STACK_POLL_MAX_ATTEMPTS: u32 = 360;
}

/// Keys of the eksctl ClusterConfig document
pub mod spec_keys {
    pub const PRIVATE_CLUSTER: &str = "privateCluster";
    pub const ENABLED: &str = "enabled";
    pub const SKIP_ENDPOINT_CREATION: &str = "skipEndpointCreation";
    pub const ADDITIONAL_ENDPOINT_SERVICES: &str = "additionalEndpointServices";
    pub const VPC: &str = "vpc";
    pub const CLUSTER_ENDPOINTS: &str = "clusterEndpoints";
    pub const SECURITY_GROUP: &str = "securityGroup";
    pub const SHARED_NODE_SECURITY_GROUP: &str = "sharedNodeSecurityGroup";
    pub const MANAGED_NODE_GROUPS: &str = "managedNodeGroups";
    pub const PRE_BOOTSTRAP_COMMANDS: &str = "preBootstrapCommands";

    /// Endpoint service needed by the cluster autoscaler in a private cluster
    pub const AUTOSCALING_SERVICE: &str = "autoscaling";
}

/// Default node pool sizing when the request leaves it open
pub mod node_pool {
    pub const DEFAULT_NODES: u32 = 3;
    pub const DEFAULT_MIN_NODES: u32 = 2;
    pub const DEFAULT_MAX_NODES: u32 = 5;
}

/// Names and images of the in-cluster add-ons
pub mod addons {
    pub const ADDON_NAMESPACE: &str = "kube-system";

    pub const AUTOSCALER_NAME: &str = "cluster-autoscaler";
    pub const AUTOSCALER_IMAGE: &str = "registry.k8s.io/autoscaling/cluster-autoscaler:v1.30.2";

    pub const GPU_DRIVER_NAME: &str = "nvidia-device-plugin";
    pub const GPU_DRIVER_IMAGE: &str = "nvcr.io/nvidia/k8s-device-plugin:v0.16.2";

    pub const METRICS_SERVER_NAME: &str = "metrics-server";
    pub const METRICS_SERVER_IMAGE: &str = "registry.k8s.io/metrics-server/metrics-server:v0.7.2";
}
