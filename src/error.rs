// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::addons::AddOn;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionerError {
    #[error("Failed to parse cluster spec: {0}")]
    SpecParse(String),

    #[error("eksctl dry-run failed (exit code {code:?}): {output}")]
    ProvisioningCommand { code: Option<i32>, output: String },

    #[error("Failed to create cluster {cluster_id}: {output}")]
    ProvisioningFailed { cluster_id: String, output: String },

    #[error("Failed to make cluster {cluster_id} fully private: {output}")]
    PrivatizationFailed { cluster_id: String, output: String },

    #[error("Failed to describe cluster {cluster_id}: {message}")]
    DescribeFailed { cluster_id: String, message: String },

    #[error("Failed to install {addon} add-on: {message}")]
    AddOn { addon: AddOn, message: String },

    #[error("Failed to delete cluster {cluster_id}: {output}")]
    DeletionFailed { cluster_id: String, output: String },

    #[error("Command `{command}` failed (exit code {code:?}): {output}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("Kubeconfig error: {0}")]
    Kubeconfig(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Instance metadata error: {0}")]
    Metadata(String),

    #[error("No stack found for cluster {cluster_id} after {attempts} attempts")]
    StackNotFound { cluster_id: String, attempts: u32 },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

pub type Result<T> = std::result::Result<T, ProvisionerError>;
