// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Network access to private cluster endpoints.

pub mod metadata;
pub mod reconciler;

pub use metadata::{ImdsClient, InstanceMetadata};
pub use reconciler::{NetworkAccessReconciler, NetworkAccessReport, NetworkAccessTask};
