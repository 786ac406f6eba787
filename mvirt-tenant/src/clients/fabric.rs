//! Client for the network fabric controller.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::FabricCleaner;
use crate::error::CallbackError;

/// Removes fabric VLAN networks through the fabric controller's REST endpoint.
pub struct HttpFabricCleaner {
    http: Client,
    endpoint: String,
}

impl HttpFabricCleaner {
    pub fn new(http: Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl FabricCleaner for HttpFabricCleaner {
    async fn cleanup_network(&self, hostname: &str, tag: u16) -> Result<(), CallbackError> {
        let url = format!("{}/networks/{}", self.endpoint, tag);
        debug!("Removing fabric network {} for {}", tag, hostname);

        let response = self
            .http
            .delete(&url)
            .query(&[("device", hostname)])
            .send()
            .await
            .map_err(|e| CallbackError::new(format!("tag {}: {}", tag, e)))?;

        let status = response.status();
        // Already gone on the fabric side.
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallbackError::new(format!(
                "tag {}: fabric returned {}: {}",
                tag, status, body
            )));
        }

        info!("Fabric network {} removed for {}", tag, hostname);
        Ok(())
    }
}

/// Used when no fabric endpoint is configured. Tagged VLANs cannot be
/// released without one, so every call fails.
pub struct UnconfiguredFabric;

#[async_trait]
impl FabricCleaner for UnconfiguredFabric {
    async fn cleanup_network(&self, hostname: &str, tag: u16) -> Result<(), CallbackError> {
        Err(CallbackError::new(format!(
            "no fabric endpoint configured to release tag {} on {}",
            tag, hostname
        )))
    }
}
