// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster spec construction.

pub mod args;
pub mod builder;
pub mod document;
pub mod steps;

pub use builder::{BuiltSpec, SpecBuilder};
pub use document::ClusterSpecDocument;
pub use steps::{OverridePlan, SecurityGroupPlacement, SpecStep};
