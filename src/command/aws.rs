// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! aws CLI wrapper

use crate::command::runner::{CommandRunner, Invocation};
use crate::error::{ProvisionerError, Result};
use crate::types::ConnectionInfo;
use serde::Deserialize;
use std::net::IpAddr;
use std::sync::Arc;

/// aws CLI, limited to the calls made while opening network access
#[derive(Clone)]
pub struct Aws {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    connection: ConnectionInfo,
}

/// Where inbound traffic allowed by an ingress rule comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressSource {
    SecurityGroup(String),
    Address(IpAddr),
}

impl IngressSource {
    fn args(&self) -> Vec<String> {
        match self {
            IngressSource::SecurityGroup(group_id) => {
                vec!["--source-group".to_string(), group_id.clone()]
            }
            IngressSource::Address(ip) => vec!["--cidr".to_string(), format!("{}/32", ip)],
        }
    }
}

#[derive(Debug, Deserialize)]
struct DescribeStackResourceOutput {
    #[serde(rename = "StackResourceDetail", default)]
    detail: Option<StackResourceDetail>,
}

#[derive(Debug, Deserialize)]
struct StackResourceDetail {
    #[serde(rename = "PhysicalResourceId")]
    physical_resource_id: Option<String>,
}

impl Aws {
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

    fn invocation(&self, args: Vec<String>) -> Invocation {
        Invocation::new(&self.binary, args).with_env(self.connection.env())
    }

    /// Physical id of a resource of a CloudFormation stack
    pub async fn describe_stack_resource(
        &self,
        stack_name: &str,
        logical_id: &str,
    ) -> Result<Option<String>> {
        let mut args = vec!["cloudformation".to_string(), "describe-stack-resource".to_string()];
        args.extend(self.connection.region_args());
        args.extend([
            "--stack-name".to_string(),
            stack_name.to_string(),
            "--logical-resource-id".to_string(),
            logical_id.to_string(),
        ]);

        let invocation = self.invocation(args);
        let output = self.runner.output(&invocation).await?;
        if !output.success() {
            return Err(ProvisionerError::CommandFailed {
                command: invocation.command_line(),
                code: output.code,
                output: output.combined(),
            });
        }

        let described: DescribeStackResourceOutput = serde_json::from_str(&output.stdout)?;
        Ok(described.detail.and_then(|d| d.physical_resource_id))
    }

    /// Allow all protocols from `source` into the security group `group_id`
    pub async fn authorize_ingress(&self, group_id: &str, source: &IngressSource) -> Result<()> {
        let mut args = vec!["ec2".to_string(), "authorize-security-group-ingress".to_string()];
        args.extend(self.connection.region_args());
        args.extend([
            "--group-id".to_string(),
            group_id.to_string(),
            "--protocol".to_string(),
            "all".to_string(),
        ]);
        args.extend(source.args());

        let invocation = self.invocation(args);
        let output = self.runner.run_logged(&invocation).await?;
        if !output.success() {
            return Err(ProvisionerError::CommandFailed {
                command: invocation.command_line(),
                code: output.code,
                output: output.combined(),
            });
        }
        Ok(())
    }
}
