//! Client for the port allocation plugin.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::PortDeallocator;
use crate::error::CallbackError;

/// Deallocates ports through the plugin's REST endpoint.
pub struct PluginPortDeallocator {
    http: Client,
    endpoint: String,
}

impl PluginPortDeallocator {
    pub fn new(http: Client, endpoint: &str) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PortDeallocator for PluginPortDeallocator {
    async fn deallocate(&self, port_name: &str) -> Result<(), CallbackError> {
        let url = format!("{}/ports", self.endpoint);
        debug!("Deallocating port {} via {}", port_name, url);

        let response = self
            .http
            .delete(&url)
            .query(&[("name", port_name)])
            .send()
            .await
            .map_err(|e| CallbackError::new(format!("port {}: {}", port_name, e)))?;

        if !response.status().is_success() {
            return Err(CallbackError::new(format!(
                "port {}: plugin returned {}",
                port_name,
                response.status()
            )));
        }
        Ok(())
    }
}

/// Used when no plugin endpoint is configured.
pub struct NoopPortDeallocator;

#[async_trait]
impl PortDeallocator for NoopPortDeallocator {
    async fn deallocate(&self, port_name: &str) -> Result<(), CallbackError> {
        debug!("No plugin configured, keeping port {}", port_name);
        Ok(())
    }
}
