// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::constants::files::{KUBECONFIG, SPEC_SUFFIX};
use std::path::{Path, PathBuf};

/// Files written during one lifecycle run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterPaths {
    /// eksctl ClusterConfig passed to `create cluster -f`
    pub spec: PathBuf,
    /// Kubeconfig eksctl writes; removed before each start
    pub kubeconfig: PathBuf,
}

impl ClusterPaths {
    pub fn for_cluster(work_dir: &Path, cluster_id: &str) -> Self {
        Self {
            spec: work_dir.join(format!("{}{}", cluster_id, SPEC_SUFFIX)),
            kubeconfig: work_dir.join(KUBECONFIG),
        }
    }
}
