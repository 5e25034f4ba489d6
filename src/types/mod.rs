// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Input and output records of the cluster lifecycle.

pub mod request;
pub mod result;

pub use request::{ClusterMode, ClusterRequest, ConnectionInfo, NetworkingSettings, NodePool};
pub use result::{
    ClusterResult, ContainerOverrides, ExecutionConfigOverrides, Overrides, RuntimeData,
};
