// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Private address of the machine running the provisioner.

use crate::error::{ProvisionerError, Result};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

const TOKEN_TTL_SECS: &str = "21600";
const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Source of the caller's own private IP address
#[async_trait]
pub trait InstanceMetadata: Send + Sync {
    async fn private_ip(&self) -> Result<IpAddr>;
}

/// EC2 instance metadata service client (IMDSv2)
pub struct ImdsClient {
    client: reqwest::Client,
    endpoint: String,
}

impl ImdsClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(metadata_error)?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    async fn token(&self) -> Result<String> {
        self.client
            .put(format!("{}/latest/api/token", self.endpoint))
            .header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECS)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(metadata_error)?
            .text()
            .await
            .map_err(metadata_error)
    }
}

#[async_trait]
impl InstanceMetadata for ImdsClient {
    async fn private_ip(&self) -> Result<IpAddr> {
        let token = self.token().await?;

        let body = self
            .client
            .get(format!("{}/latest/meta-data/local-ipv4", self.endpoint))
            .header("X-aws-ec2-metadata-token", token.trim())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(metadata_error)?
            .text()
            .await
            .map_err(metadata_error)?;

        debug!("Instance metadata reports private IP {}", body.trim());
        body.trim().parse().map_err(|e| {
            ProvisionerError::Metadata(format!("invalid local-ipv4 '{}': {}", body.trim(), e))
        })
    }
}

fn metadata_error(e: reqwest::Error) -> ProvisionerError {
    ProvisionerError::Metadata(e.to_string())
}
