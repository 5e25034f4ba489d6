// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Start and stop of a single EKS cluster.

pub mod controller;
pub mod overrides;
pub mod paths;

pub use controller::{ClusterController, Dependencies, LifecycleState};
pub use overrides::make_overrides;
pub use paths::ClusterPaths;
