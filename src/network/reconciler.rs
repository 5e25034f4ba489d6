// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Lets the caller into the security groups eksctl creates for the cluster.
//!
//! Runs next to `eksctl create cluster`: the stack and its security groups
//! only appear while the cluster is being created, and eksctl itself needs
//! to reach the private endpoints guarded by them before it finishes.

use crate::command::{Aws, Eksctl, IngressSource};
use crate::config::StackPolling;
use crate::constants::stack::LOGICAL_SECURITY_GROUPS;
use crate::error::{ProvisionerError, Result};
use crate::network::metadata::InstanceMetadata;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, info_span, warn, Instrument};

/// What a reconciliation run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkAccessReport {
    pub stack_name: String,
    /// Security groups an ingress rule was added to
    pub authorized: Vec<String>,
    /// Security groups where adding the rule failed
    pub failed: Vec<String>,
}

pub struct NetworkAccessReconciler {
    eksctl: Eksctl,
    aws: Aws,
    metadata: Arc<dyn InstanceMetadata>,
    polling: StackPolling,
}

/// Handle on a spawned reconciliation.
///
/// Dropping it detaches the task, which then runs until it finishes or the
/// process exits.
#[derive(Debug)]
pub struct NetworkAccessTask {
    cluster_id: String,
    handle: JoinHandle<Result<NetworkAccessReport>>,
}

impl NetworkAccessTask {
    pub fn cluster_id(&self) -> &str {
        &self.cluster_id
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> Result<NetworkAccessReport> {
        self.handle.await?
    }

    /// Wait at most `timeout`; `None` when the task is still running
    pub async fn wait_timeout(self, timeout: Duration) -> Option<Result<NetworkAccessReport>> {
        tokio::time::timeout(timeout, self.wait()).await.ok()
    }
}

impl NetworkAccessReconciler {
    pub fn new(
        eksctl: Eksctl,
        aws: Aws,
        metadata: Arc<dyn InstanceMetadata>,
        polling: StackPolling,
    ) -> Self {
        Self {
            eksctl,
            aws,
            metadata,
            polling,
        }
    }

    /// Start reconciling in the background without waiting for it.
    ///
    /// `caller_group` is the caller's own security group; without one, access
    /// is granted to the caller's private IP.
    pub fn spawn(self, cluster_id: String, caller_group: Option<String>) -> NetworkAccessTask {
        let span = info_span!("network_access", cluster = %cluster_id);
        let task_cluster_id = cluster_id.clone();

        let handle = tokio::spawn(
            async move {
                let result = self
                    .reconcile(&task_cluster_id, caller_group.as_deref())
                    .await;
                match &result {
                    Ok(report) => info!(
                        "Network access reconciled on stack {}: {} authorized, {} failed",
                        report.stack_name,
                        report.authorized.len(),
                        report.failed.len()
                    ),
                    Err(e) => warn!("Network access reconciliation gave up: {}", e),
                }
                result
            }
            .instrument(span),
        );

        NetworkAccessTask { cluster_id, handle }
    }

    pub async fn reconcile(
        &self,
        cluster_id: &str,
        caller_group: Option<&str>,
    ) -> Result<NetworkAccessReport> {
        let stack_name = self.wait_for_stack(cluster_id).await?;
        info!("Stack name is {}", stack_name);

        let group_ids = self.resolve_security_groups(&stack_name, caller_group).await;

        let source = match caller_group {
            Some(group_id) => IngressSource::SecurityGroup(group_id.to_string()),
            None => IngressSource::Address(self.metadata.private_ip().await?),
        };

        let mut report = NetworkAccessReport {
            stack_name,
            ..Default::default()
        };
        for group_id in group_ids {
            info!("Adding {:?} to inbound rules of {}", source, group_id);
            match self.aws.authorize_ingress(&group_id, &source).await {
                Ok(()) => report.authorized.push(group_id),
                Err(e) => {
                    warn!("Failed to add security group rule to {}: {}", group_id, e);
                    report.failed.push(group_id);
                }
            }
        }
        Ok(report)
    }

    /// Poll until eksctl reports a stack for the cluster.
    ///
    /// Any failure counts as "not there yet": eksctl has no way to tell a
    /// missing stack from one that is still being created.
    async fn wait_for_stack(&self, cluster_id: &str) -> Result<String> {
        let mut attempts = 0u32;
        loop {
            sleep(self.polling.interval).await;
            attempts += 1;

            match self.eksctl.describe_stack_name(cluster_id).await {
                Ok(Some(stack_name)) => return Ok(stack_name),
                Ok(None) => debug!("Not yet able to get stack name (attempt {})", attempts),
                Err(e) => debug!(
                    "Not yet able to get stack name (attempt {}): {}",
                    attempts, e
                ),
            }

            if self.polling.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(ProvisionerError::StackNotFound {
                    cluster_id: cluster_id.to_string(),
                    attempts,
                });
            }
        }
    }

    /// Physical ids of the cluster security groups, minus the caller's own
    async fn resolve_security_groups(
        &self,
        stack_name: &str,
        caller_group: Option<&str>,
    ) -> Vec<String> {
        let mut group_ids = Vec::new();
        for logical_id in LOGICAL_SECURITY_GROUPS {
            match self.aws.describe_stack_resource(stack_name, logical_id).await {
                Ok(Some(group_id)) => {
                    info!("{} security group is {}", logical_id, group_id);
                    if Some(group_id.as_str()) != caller_group {
                        group_ids.push(group_id);
                    }
                }
                Ok(None) => warn!("No physical id for {} in stack {}", logical_id, stack_name),
                Err(e) => warn!("Not able to get security group id for {}: {}", logical_id, e),
            }
        }
        group_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{describe_resource_json, ScriptedRunner, StaticMetadata};
    use crate::types::ConnectionInfo;

    fn reconciler(runner: &Arc<ScriptedRunner>, max_attempts: Option<u32>) -> NetworkAccessReconciler {
        let connection = ConnectionInfo {
            region: Some("eu-west-1".to_string()),
            ..Default::default()
        };
        NetworkAccessReconciler::new(
            Eksctl::new(runner.clone(), "eksctl", connection.clone()),
            Aws::new(runner.clone(), "aws", connection),
            Arc::new(StaticMetadata::new("10.0.0.7")),
            StackPolling {
                interval: Duration::from_millis(1),
                max_attempts,
            },
        )
    }

    fn stack_runner() -> ScriptedRunner {
        ScriptedRunner::new()
            .on_sequence(
                &["utils", "describe-stacks"],
                vec![
                    (0, "[]", ""),
                    (1, "", "AccessDenied"),
                    (0, r#"[{"StackName": "eksctl-demo1-cluster"}]"#, ""),
                ],
            )
            .on(
                &[
                    "cloudformation",
                    "describe-stack-resource",
                    "--region",
                    "eu-west-1",
                    "--stack-name",
                    "eksctl-demo1-cluster",
                    "--logical-resource-id",
                    "ControlPlaneSecurityGroup",
                ],
                0,
                &describe_resource_json("sg-cp"),
                "",
            )
            .on(
                &[
                    "cloudformation",
                    "describe-stack-resource",
                    "--region",
                    "eu-west-1",
                    "--stack-name",
                    "eksctl-demo1-cluster",
                    "--logical-resource-id",
                    "ClusterSharedNodeSecurityGroup",
                ],
                0,
                &describe_resource_json("sg-shared"),
                "",
            )
    }

    #[tokio::test]
    async fn test_waits_for_stack_before_resolving_groups() {
        let runner = Arc::new(stack_runner());

        let report = reconciler(&runner, Some(10))
            .reconcile("demo1", None)
            .await
            .unwrap();

        assert_eq!(report.stack_name, "eksctl-demo1-cluster");
        assert_eq!(report.authorized, vec!["sg-cp", "sg-shared"]);

        let calls = runner.calls();
        let stack_calls: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.has_args_prefix(&["utils", "describe-stacks"]))
            .map(|(i, _)| i)
            .collect();
        let first_resource = calls
            .iter()
            .position(|c| c.has_args_prefix(&["cloudformation"]))
            .unwrap();
        assert_eq!(stack_calls.len(), 3);
        assert!(first_resource > stack_calls[2]);

        let ingress: Vec<String> = calls
            .iter()
            .filter(|c| c.has_args_prefix(&["ec2", "authorize-security-group-ingress"]))
            .map(|c| c.command_line())
            .collect();
        assert_eq!(ingress.len(), 2);
        assert!(ingress[0].contains("--group-id sg-cp"));
        assert!(ingress[0].ends_with("--cidr 10.0.0.7/32"));
    }

    #[tokio::test]
    async fn test_caller_group_is_not_authorized_into_itself() {
        let runner = Arc::new(stack_runner());

        let report = reconciler(&runner, Some(10))
            .reconcile("demo1", Some("sg-shared"))
            .await
            .unwrap();

        assert_eq!(report.authorized, vec!["sg-cp"]);
        let ingress = runner
            .calls()
            .into_iter()
            .find(|c| c.has_args_prefix(&["ec2"]))
            .unwrap();
        assert!(ingress.command_line().ends_with("--source-group sg-shared"));
    }

    #[tokio::test]
    async fn test_missing_resource_and_failed_rule_are_not_fatal() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(
                    &["utils", "describe-stacks"],
                    0,
                    r#"[{"StackName": "s"}]"#,
                    "",
                )
                .on(
                    &[
                        "cloudformation",
                        "describe-stack-resource",
                        "--region",
                        "eu-west-1",
                        "--stack-name",
                        "s",
                        "--logical-resource-id",
                        "ControlPlaneSecurityGroup",
                    ],
                    254,
                    "",
                    "does not exist",
                )
                .on(
                    &["cloudformation", "describe-stack-resource"],
                    0,
                    &describe_resource_json("sg-shared"),
                    "",
                )
                .on(&["ec2"], 254, "", "InvalidPermission.Duplicate"),
        );

        let report = reconciler(&runner, Some(1))
            .reconcile("demo1", None)
            .await
            .unwrap();

        assert!(report.authorized.is_empty());
        assert_eq!(report.failed, vec!["sg-shared"]);
    }

    #[tokio::test]
    async fn test_bounded_polling_gives_up() {
        let runner = Arc::new(ScriptedRunner::new().on(&["utils", "describe-stacks"], 0, "[]", ""));

        let err = reconciler(&runner, Some(3))
            .reconcile("demo1", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionerError::StackNotFound { attempts: 3, .. }
        ));
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_reconciling_twice_authorizes_twice() {
        let runner = Arc::new(
            ScriptedRunner::new()
                .on(
                    &["utils", "describe-stacks"],
                    0,
                    r#"[{"StackName": "s"}]"#,
                    "",
                )
                .on(
                    &["cloudformation"],
                    0,
                    &describe_resource_json("sg-1"),
                    "",
                ),
        );
        let reconciler = reconciler(&runner, Some(1));

        let first = reconciler.reconcile("demo1", Some("sg-vm")).await.unwrap();
        let second = reconciler.reconcile("demo1", Some("sg-vm")).await.unwrap();

        assert_eq!(first, second);
        let ingress_calls = runner
            .calls()
            .iter()
            .filter(|c| c.has_args_prefix(&["ec2"]))
            .count();
        // both logical ids resolve to sg-1; nothing is deduplicated locally
        assert_eq!(ingress_calls, 4);
    }

    #[tokio::test]
    async fn test_spawned_task_can_be_awaited() {
        let runner = Arc::new(stack_runner());

        let task = reconciler(&runner, Some(10)).spawn("demo1".to_string(), None);
        assert_eq!(task.cluster_id(), "demo1");

        let report = task
            .wait_timeout(Duration::from_secs(5))
            .await
            .expect("reconciliation should finish")
            .unwrap();
        assert_eq!(report.authorized.len(), 2);
    }
}
