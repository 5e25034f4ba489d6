// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::kubernetes::KubeconfigSummary;
use crate::types::{ContainerOverrides, ExecutionConfigOverrides, Overrides};
use std::path::Path;

/// Overrides pointing the platform's containerized execution at the new cluster.
///
/// Image settings are left unset so the platform keeps its own.
pub fn make_overrides(kubeconfig: &KubeconfigSummary, kubeconfig_path: &Path) -> Overrides {
    Overrides {
        container: ContainerOverrides {
            execution_configs_generic_overrides: ExecutionConfigOverrides {
                kube_ctl_context: kubeconfig.current_context.clone(),
                kube_config_path: kubeconfig_path.to_path_buf(),
                base_image: None,
                repository_url: None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::kubeconfig_yaml;
    use serde_json::json;

    #[test]
    fn test_context_comes_from_kubeconfig() {
        let summary = KubeconfigSummary::parse(&kubeconfig_yaml("demo1")).unwrap();

        let overrides = make_overrides(&summary, Path::new("/work/kube_config"));

        assert_eq!(
            serde_json::to_value(&overrides).unwrap(),
            json!({
                "container": {
                    "executionConfigsGenericOverrides": {
                        "kubeCtlContext": "admin@demo1.eu-west-1.eksctl.io",
                        "kubeConfigPath": "/work/kube_config",
                        "baseImage": null,
                        "repositoryURL": null
                    }
                }
            })
        );
    }
}
