// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

use crate::constants::FIELD_MANAGER;
use crate::error::{ProvisionerError, Result};
use kube::api::{Api, DynamicObject, GroupVersionKind, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::Client;
use tracing::debug;

/// Server-side apply a single object, owned by the provisioner's field manager
pub async fn apply_manifest(client: &Client, manifest: &serde_json::Value) -> Result<()> {
    let field = |pointer: &str| {
        manifest
            .pointer(pointer)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProvisionerError::InvalidManifest(format!("missing {}", pointer)))
    };
    let kind = field("/kind")?;
    let api_version = field("/apiVersion")?;
    let name = field("/metadata/name")?;
    let namespace = manifest
        .pointer("/metadata/namespace")
        .and_then(|v| v.as_str());

    let (group, version) = api_version.split_once('/').unwrap_or(("", api_version));
    let gvk = GroupVersionKind::gvk(group, version, kind);
    let api_resource = ApiResource::from_gvk(&gvk);

    let api: Api<DynamicObject> = match namespace {
        Some(ns) => Api::namespaced_with(client.clone(), ns, &api_resource),
        None => Api::all_with(client.clone(), &api_resource),
    };

    let params = PatchParams::apply(FIELD_MANAGER).force();
    api.patch(name, &params, &Patch::Apply(manifest)).await?;

    debug!(kind = kind, name = name, "Applied manifest");
    Ok(())
}
