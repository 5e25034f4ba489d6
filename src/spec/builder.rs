// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Turns a cluster request into a complete eksctl ClusterConfig.

use crate::command::Eksctl;
use crate::error::{ProvisionerError, Result};
use crate::spec::args::dry_run_args;
use crate::spec::document::ClusterSpecDocument;
use crate::spec::steps::OverridePlan;
use crate::types::{ClusterMode, ClusterRequest};
use tracing::{debug, info, instrument};

/// A spec ready to be written, plus what it implies for network access
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltSpec {
    pub document: ClusterSpecDocument,
    /// The caller must be let into the security groups eksctl creates
    pub attach_caller: bool,
}

pub struct SpecBuilder {
    eksctl: Eksctl,
}

impl SpecBuilder {
    pub fn new(eksctl: Eksctl) -> Self {
        Self { eksctl }
    }

    /// Build the spec document for `request`.
    ///
    /// Simple mode asks eksctl for a baseline with `--dry-run` (AMIs, IAM
    /// policies and other provider defaults come from there) and applies the
    /// overrides that have no command line flag. Advanced mode uses the
    /// caller's YAML unchanged.
    #[instrument(skip(self, request), fields(cluster = %request.cluster_id))]
    pub async fn build(&self, request: &ClusterRequest) -> Result<BuiltSpec> {
        match request.mode() {
            ClusterMode::Advanced { yaml } => {
                info!("Using the advanced cluster spec as given");
                Ok(BuiltSpec {
                    document: ClusterSpecDocument::parse(yaml)?,
                    attach_caller: false,
                })
            }
            ClusterMode::Simple(_) => {
                let baseline = self.eksctl.dry_run(dry_run_args(request)).await?;
                debug!("Got spec:\n{}", baseline);

                let document = ClusterSpecDocument::parse(&baseline)?;
                if document.managed_node_groups().is_none() {
                    return Err(ProvisionerError::SpecParse(
                        "dry-run spec has no managedNodeGroups list".to_string(),
                    ));
                }

                let plan = OverridePlan::for_request(request);
                Ok(BuiltSpec {
                    document: plan.apply(document),
                    attach_caller: plan.attach_caller,
                })
            }
        }
    }
}
