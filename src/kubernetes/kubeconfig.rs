// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The kubeconfig file written by `eksctl create cluster --kubeconfig`.

use crate::error::{ProvisionerError, Result};
use crate::types::ConnectionInfo;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::{debug, info};

/// Connection fields read back from a generated kubeconfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeconfigSummary {
    pub current_context: String,
    pub cluster: Option<String>,
    pub server: Option<String>,
}

impl KubeconfigSummary {
    pub fn parse(text: &str) -> Result<Self> {
        let root: Value = serde_yaml::from_str(text)
            .map_err(|e| ProvisionerError::Kubeconfig(format!("invalid kubeconfig: {}", e)))?;

        let current_context = root
            .get("current-context")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ProvisionerError::Kubeconfig("kubeconfig has no current-context".to_string())
            })?
            .to_string();

        let cluster = find_named(&root, "contexts", &current_context)
            .and_then(|entry| entry.get("context"))
            .and_then(|context| context.get("cluster"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let server = cluster
            .as_deref()
            .and_then(|name| find_named(&root, "clusters", name))
            .and_then(|entry| entry.get("cluster"))
            .and_then(|cluster| cluster.get("server"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            current_context,
            cluster,
            server,
        })
    }

    pub async fn read(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            ProvisionerError::Kubeconfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }
}

fn find_named<'a>(root: &'a Value, list: &str, name: &str) -> Option<&'a Value> {
    root.get(list)?
        .as_sequence()?
        .iter()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))
}

/// Remove a kubeconfig left by an earlier run; eksctl would merge into it otherwise.
///
/// Returns whether a file was removed.
pub async fn remove_stale(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!("Removed previous kubeconfig {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Add the connection credentials to the `exec` environment of every user.
///
/// The token helper eksctl configures then runs with the same identity as
/// the provisioning calls. Variables already present are left alone.
pub fn inject_credentials(text: &str, connection: &ConnectionInfo) -> Result<String> {
    let mut root: Value = serde_yaml::from_str(text)
        .map_err(|e| ProvisionerError::Kubeconfig(format!("invalid kubeconfig: {}", e)))?;
    let credentials = connection.env();

    let users = root
        .get_mut("users")
        .and_then(Value::as_sequence_mut)
        .into_iter()
        .flatten();
    for user in users {
        let Some(exec) = user
            .get_mut("user")
            .and_then(|u| u.get_mut("exec"))
            .and_then(Value::as_mapping_mut)
        else {
            continue;
        };

        let env = exec
            .entry(Value::from("env"))
            .or_insert_with(|| Value::Sequence(Vec::new()));
        if !env.is_sequence() {
            *env = Value::Sequence(Vec::new());
        }
        let Value::Sequence(env) = env else {
            continue;
        };

        for (name, value) in &credentials {
            let present = env
                .iter()
                .any(|e| e.get("name").and_then(Value::as_str) == Some(name.as_str()));
            if !present {
                let mut var = Mapping::new();
                var.insert(Value::from("name"), Value::from(name.as_str()));
                var.insert(Value::from("value"), Value::from(value.as_str()));
                env.push(Value::Mapping(var));
            }
        }
    }

    serde_yaml::to_string(&root).map_err(|e| ProvisionerError::Kubeconfig(e.to_string()))
}

/// Rewrite the kubeconfig at `path` with the connection credentials
pub async fn setup_credentials(path: &Path, connection: &ConnectionInfo) -> Result<()> {
    if connection.env().is_empty() {
        debug!("No explicit credentials, leaving kubeconfig as generated");
        return Ok(());
    }
    let text = tokio::fs::read_to_string(path).await?;
    tokio::fs::write(path, inject_credentials(&text, connection)?).await?;
    Ok(())
}
