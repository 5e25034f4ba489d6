// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! eksctl CLI wrapper

use crate::command::runner::{CommandRunner, Invocation};
use crate::error::{ProvisionerError, Result};
use crate::types::ConnectionInfo;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// eksctl invocations used across the cluster lifecycle
#[derive(Clone)]
pub struct Eksctl {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    connection: ConnectionInfo,
}

/// One entry of `eksctl utils describe-stacks --output json`
#[derive(Debug, Clone, Deserialize)]
pub struct StackSummary {
    #[serde(rename = "StackName")]
    pub stack_name: String,
}

impl Eksctl {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        binary: impl Into<String>,
        connection: ConnectionInfo,
    ) -> Self {
        Self {
            runner,
            binary: binary.into(),
            connection,
        }
    }

    pub fn region_args(&self) -> Vec<String> {
        self.connection.region_args()
    }

    fn invocation(&self, args: Vec<String>) -> Invocation {
        Invocation::new(&self.binary, args).with_env(self.connection.env())
    }

    /// Run `create cluster ... --dry-run` and return the generated ClusterConfig
    pub async fn dry_run(&self, mut args: Vec<String>) -> Result<String> {
        args.push("--dry-run".to_string());
        let output = self.runner.output(&self.invocation(args)).await?;

        if !output.success() {
            return Err(ProvisionerError::ProvisioningCommand {
                code: output.code,
                output: output.combined(),
            });
        }
        Ok(output.stdout)
    }

    /// Create the cluster described by `spec_path`, writing its kubeconfig to `kubeconfig_path`
    pub async fn create_cluster(
        &self,
        cluster_id: &str,
        spec_path: &Path,
        kubeconfig_path: &Path,
    ) -> Result<()> {
        let args = vec![
            "create".to_string(),
            "cluster".to_string(),
            "-v".to_string(),
            "4".to_string(),
            "-f".to_string(),
            spec_path.display().to_string(),
            "--kubeconfig".to_string(),
            kubeconfig_path.display().to_string(),
        ];
        let output = self.runner.run_logged(&self.invocation(args)).await?;

        if !output.success() {
            return Err(ProvisionerError::ProvisioningFailed {
                cluster_id: cluster_id.to_string(),
                output: output.combined(),
            });
        }
        Ok(())
    }

    /// Disable the public API endpoint, keeping only the private one
    pub async fn make_private_only(&self, cluster_id: &str) -> Result<()> {
        let mut args = vec![
            "utils".to_string(),
            "update-cluster-endpoints".to_string(),
            "--name".to_string(),
            cluster_id.to_string(),
            "--private-access=true".to_string(),
            "--public-access=false".to_string(),
            "--approve".to_string(),
        ];
        args.extend(self.region_args());
        let output = self.runner.run_logged(&self.invocation(args)).await?;

        if !output.success() {
            return Err(ProvisionerError::PrivatizationFailed {
                cluster_id: cluster_id.to_string(),
                output: output.combined(),
            });
        }
        Ok(())
    }

    /// Cluster descriptor: the first element of `get cluster -o json`
    pub async fn get_cluster(&self, cluster_id: &str) -> Result<serde_json::Value> {
        let mut args = vec![
            "get".to_string(),
            "cluster".to_string(),
            "--name".to_string(),
            cluster_id.to_string(),
        ];
        args.extend(self.region_args());
        args.extend(["-o".to_string(), "json".to_string()]);

        let describe_failed = |message: String| ProvisionerError::DescribeFailed {
            cluster_id: cluster_id.to_string(),
            message,
        };

        let output = self.runner.output(&self.invocation(args)).await?;
        if !output.success() {
            return Err(describe_failed(output.combined()));
        }

        let clusters: Vec<serde_json::Value> = serde_json::from_str(&output.stdout)
            .map_err(|e| describe_failed(format!("invalid JSON output: {}", e)))?;
        clusters
            .into_iter()
            .next()
            .ok_or_else(|| describe_failed("no cluster returned".to_string()))
    }

    /// Name of the CloudFormation stack of the cluster, `None` while it does not exist yet
    pub async fn describe_stack_name(&self, cluster_id: &str) -> Result<Option<String>> {
        let mut args = vec![
            "utils".to_string(),
            "describe-stacks".to_string(),
            "--cluster".to_string(),
            cluster_id.to_string(),
        ];
        args.extend(self.region_args());
        args.extend(["--output".to_string(), "json".to_string()]);

        let invocation = self.invocation(args);
        let output = self.runner.output(&invocation).await?;
        if !output.success() {
            return Err(ProvisionerError::CommandFailed {
                command: invocation.command_line(),
                code: output.code,
                output: output.combined(),
            });
        }

        let stacks: Vec<StackSummary> = serde_json::from_str(&output.stdout)?;
        debug!("Found {} stacks for cluster {}", stacks.len(), cluster_id);
        Ok(stacks.into_iter().next().map(|s| s.stack_name))
    }

    pub async fn delete_cluster(&self, cluster_id: &str) -> Result<()> {
        let mut args = vec![
            "delete".to_string(),
            "cluster".to_string(),
            "-v".to_string(),
            "4".to_string(),
            "--name".to_string(),
            cluster_id.to_string(),
        ];
        args.extend(self.region_args());
        let output = self.runner.run_logged(&self.invocation(args)).await?;

        if !output.success() {
            return Err(ProvisionerError::DeletionFailed {
                cluster_id: cluster_id.to_string(),
                output: output.combined(),
            });
        }
        Ok(())
    }
}
