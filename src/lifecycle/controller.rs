// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster lifecycle controller.
//!
//! `start` walks `Building → SpecWritten → Provisioning → [Privatizing] →
//! Describing → AddOns → Done`; any error moves it to `Failed`. `stop` is
//! independent of `start` and only needs the request.

use crate::addons::{AddOn, AddOnInstaller, AddOnTarget};
use crate::command::{Aws, CommandRunner, Eksctl};
use crate::config::Config;
use crate::error::{ProvisionerError, Result};
use crate::kubernetes::kubeconfig::{self, KubeconfigSummary};
use crate::lifecycle::overrides::make_overrides;
use crate::lifecycle::paths::ClusterPaths;
use crate::network::{InstanceMetadata, NetworkAccessReconciler, NetworkAccessTask};
use crate::spec::SpecBuilder;
use crate::types::{ClusterRequest, ClusterResult, RuntimeData};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Building,
    SpecWritten,
    Provisioning,
    Privatizing,
    Describing,
    AddOns,
    Done,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// External collaborators of the controller
#[derive(Clone)]
pub struct Dependencies {
    pub runner: Arc<dyn CommandRunner>,
    pub addons: Arc<dyn AddOnInstaller>,
    pub metadata: Arc<dyn InstanceMetadata>,
}

pub struct ClusterController {
    request: ClusterRequest,
    config: Config,
    paths: ClusterPaths,
    deps: Dependencies,
    state: LifecycleState,
}

impl ClusterController {
    pub fn new(request: ClusterRequest, config: Config, deps: Dependencies) -> Self {
        let paths = ClusterPaths::for_cluster(&config.work_dir, &request.cluster_id);
        Self {
            request,
            config,
            paths,
            deps,
            state: LifecycleState::Building,
        }
    }

    pub fn with_paths(mut self, paths: ClusterPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    fn eksctl(&self) -> Eksctl {
        Eksctl::new(
            self.deps.runner.clone(),
            self.config.eksctl_path.clone(),
            self.request.connection.clone(),
        )
    }

    fn aws(&self) -> Aws {
        Aws::new(
            self.deps.runner.clone(),
            self.config.aws_path.clone(),
            self.request.connection.clone(),
        )
    }

    fn enter(&mut self, state: LifecycleState) {
        info!(from = %self.state, to = %state, "Cluster lifecycle transition");
        self.state = state;
    }

    /// Create the cluster and return what the platform needs to use it
    #[instrument(skip(self), fields(cluster = %self.request.cluster_id))]
    pub async fn start(&mut self) -> Result<ClusterResult> {
        match self.provision().await {
            Ok(result) => {
                self.enter(LifecycleState::Done);
                Ok(result)
            }
            Err(e) => {
                error!("Cluster start failed while {}: {}", self.state, e);
                self.enter(LifecycleState::Failed);
                Err(e)
            }
        }
    }

    async fn provision(&mut self) -> Result<ClusterResult> {
        let cluster_id = self.request.cluster_id.clone();
        let eksctl = self.eksctl();

        self.enter(LifecycleState::Building);
        let built = SpecBuilder::new(eksctl.clone()).build(&self.request).await?;

        self.enter(LifecycleState::SpecWritten);
        tokio::fs::write(&self.paths.spec, built.document.to_yaml()?).await?;
        info!("Cluster spec written to {}", self.paths.spec.display());
        kubeconfig::remove_stale(&self.paths.kubeconfig).await?;

        self.enter(LifecycleState::Provisioning);
        // The stack only exists while create runs, so access is reconciled alongside it
        let network_access = self.start_network_access(built.attach_caller);
        eksctl
            .create_cluster(&cluster_id, &self.paths.spec, &self.paths.kubeconfig)
            .await?;

        if self.request.make_private_only {
            self.enter(LifecycleState::Privatizing);
            eksctl.make_private_only(&cluster_id).await?;
        }

        self.enter(LifecycleState::Describing);
        let cluster = eksctl.get_cluster(&cluster_id).await?;
        kubeconfig::setup_credentials(&self.paths.kubeconfig, &self.request.connection).await?;
        let summary = KubeconfigSummary::read(&self.paths.kubeconfig).await?;
        info!(
            context = %summary.current_context,
            cluster = summary.cluster.as_deref().unwrap_or("-"),
            server = summary.server.as_deref().unwrap_or("-"),
            "Cluster API endpoint resolved"
        );

        self.enter(LifecycleState::AddOns);
        let addon_errors = self.install_addons().await;

        Ok(ClusterResult {
            overrides: make_overrides(&summary, &self.paths.kubeconfig),
            runtime_data: RuntimeData {
                kube_config_path: self.paths.kubeconfig.clone(),
                cluster,
            },
            addon_errors,
            network_access,
        })
    }

    fn start_network_access(&self, attach_caller: bool) -> Option<NetworkAccessTask> {
        let caller_group = self.request.injected_security_group().map(str::to_string);
        if caller_group.is_none() && !attach_caller {
            return None;
        }

        info!(
            "Granting {} access to the cluster security groups",
            caller_group.as_deref().unwrap_or("this host")
        );
        let reconciler = NetworkAccessReconciler::new(
            self.eksctl(),
            self.aws(),
            self.deps.metadata.clone(),
            self.config.stack_poll,
        );
        Some(reconciler.spawn(self.request.cluster_id.clone(), caller_group))
    }

    fn requested_addons(&self) -> Vec<AddOn> {
        let mut addons = Vec::new();
        if self.request.has_autoscaling() {
            addons.push(AddOn::Autoscaler);
        }
        if self.request.has_gpu() {
            addons.push(AddOn::GpuDriver);
        }
        if self.request.install_metrics_server {
            addons.push(AddOn::MetricsServer);
        }
        addons
    }

    async fn install_addons(&self) -> Vec<ProvisionerError> {
        let target = AddOnTarget {
            cluster_id: self.request.cluster_id.clone(),
            kubeconfig_path: self.paths.kubeconfig.clone(),
        };

        let mut errors = Vec::new();
        for addon in self.requested_addons() {
            info!("Ensuring {}", addon);
            if let Err(e) = self.deps.addons.ensure(addon, &target).await {
                warn!("Failed to install {}, the cluster is up without it: {}", addon, e);
                errors.push(ProvisionerError::AddOn {
                    addon,
                    message: e.to_string(),
                });
            }
        }
        errors
    }

    /// Delete the cluster
    #[instrument(skip(self, runtime_data), fields(cluster = %self.request.cluster_id))]
    pub async fn stop(&self, runtime_data: Option<&RuntimeData>) -> Result<()> {
        if let Some(data) = runtime_data {
            info!(
                "Deleting cluster last reachable through {}",
                data.kube_config_path.display()
            );
        }
        self.eksctl().delete_cluster(&self.request.cluster_id).await
    }
}
