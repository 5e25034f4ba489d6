// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for the provisioned cluster: kubeconfig handling,
//! client creation and server-side apply.

pub mod apply;
pub mod client;
pub mod kubeconfig;

pub use apply::apply_manifest;
pub use client::client_from_kubeconfig_file;
pub use kubeconfig::KubeconfigSummary;
