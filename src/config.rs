// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::polling::{STACK_POLL_INTERVAL_SECS, STACK_POLL_MAX_ATTEMPTS};
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254";

/// Provisioner configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory receiving the spec document and the kubeconfig
    pub work_dir: PathBuf,
    pub eksctl_path: String,
    pub aws_path: String,
    pub stack_poll: StackPolling,
    pub imds_endpoint: String,
}

/// How the network access reconciler waits for the cluster stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackPolling {
    pub interval: Duration,
    /// `None` polls until the process exits
    pub max_attempts: Option<u32>,
}

impl Default for StackPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(STACK_POLL_INTERVAL_SECS),
            max_attempts: Some(STACK_POLL_MAX_ATTEMPTS),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let work_dir = match env::var("EKS_CLUSTER_WORK_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => env::current_dir().context("Cannot determine current working directory")?,
        };

        let interval_secs = parse_var("STACK_POLL_INTERVAL_SECS", STACK_POLL_INTERVAL_SECS)?;
        let max_attempts = parse_var("STACK_POLL_MAX_ATTEMPTS", STACK_POLL_MAX_ATTEMPTS)?;

        Ok(Config {
            work_dir,
            eksctl_path: env::var("EKSCTL_PATH").unwrap_or_else(|_| "eksctl".to_string()),
            aws_path: env::var("AWS_CLI_PATH").unwrap_or_else(|_| "aws".to_string()),
            stack_poll: StackPolling {
                interval: Duration::from_secs(interval_secs),
                max_attempts: (max_attempts > 0).then_some(max_attempts),
            },
            imds_endpoint: env::var("IMDS_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_IMDS_ENDPOINT.to_string()),
        })
    }

    /// Configuration rooted in `work_dir` with all other settings at their defaults
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Config {
            work_dir: work_dir.into(),
            eksctl_path: "eksctl".to_string(),
            aws_path: "aws".to_string(),
            stack_poll: StackPolling::default(),
            imds_endpoint: DEFAULT_IMDS_ENDPOINT.to_string(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number: {}", name, value)),
        Err(_) => Ok(default),
    }
}
